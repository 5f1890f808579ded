//! Scroll-synchronised camera choreography.

pub mod keyframes;
pub mod mapper;
pub mod page;
pub mod region;

pub use keyframes::{KeyframeId, KeyframeSet};
pub use mapper::{default_transitions, CameraTransition, IntroConfig, OffsetKind, Route, ScrollCameraMapper};
pub use page::{PageConfig, PageSection, VirtualPage};
pub use region::{ScrollRegion, SectionId, SectionProbe};
