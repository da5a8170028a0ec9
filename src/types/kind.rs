//! Well-known decoration type strings.
//!
//! Item types stay open strings because the rule table is merchant-editable;
//! these are the values the classifier, reconciler and synthesizer branch on.

pub const EDIBLE_3D_COMPLEX: &str = "edible_3d_complex";
pub const EDIBLE_3D_ORDINARY: &str = "edible_3d_ordinary";
pub const EDIBLE_3D_SUPPORT: &str = "edible_3d_support";
pub const EDIBLE_2D_SUPPORT: &str = "edible_2d_support";
pub const EDIBLE_2D_SHAPES: &str = "edible_2d_shapes";
pub const EDIBLE_2D_GUMPASTE: &str = "edible_2d_gumpaste";
pub const EDIBLE_FLOWERS: &str = "edible_flowers";
pub const EDIBLE_PHOTO_TOP: &str = "edible_photo_top";
pub const EDIBLE_PHOTO_SIDE: &str = "edible_photo_side";
pub const PRINTOUT: &str = "printout";
pub const SUPPORT_PRINTOUT: &str = "support_printout";
pub const TOY: &str = "toy";
pub const FIGURINE: &str = "figurine";
pub const PLASTIC_BALL: &str = "plastic_ball";
pub const PLASTIC_BALL_REGULAR: &str = "plastic_ball_regular";
pub const PLASTIC_BALL_DISCO: &str = "plastic_ball_disco";
pub const GUMPASTE_BUNDLE: &str = "gumpaste_bundle";
pub const ICING_DOODLE: &str = "icing_doodle";
pub const ICING_PALETTE_KNIFE: &str = "icing_palette_knife";
