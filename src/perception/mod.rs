pub mod builder;
pub mod cover;
pub mod package;

pub use builder::build_package;
pub use cover::{classify_cover, estimate_cover, CoverEstimate};
pub use package::{
    Concealment, CoverLevel, CoverModifier, PerceptionPackage, VisibilityLevel,
    STANDARD_DETAIL_RANGE_M,
};
