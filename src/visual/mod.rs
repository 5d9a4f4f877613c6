pub mod hit;
pub mod physics;
pub mod scene;
pub mod selection;
pub mod style;
pub mod surface;
pub mod tooltip;

pub use scene::{EMPTY_GRAPH_MESSAGE, GraphScene, LayoutStart, NodeChannels, SceneLink, SceneNode};
pub use selection::{Picked, Selection};
pub use surface::Surface;
pub use tooltip::{InfoBox, InfoLine};
