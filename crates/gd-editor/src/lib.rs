pub mod backend;
pub mod bus;
pub mod config;
pub mod drag;
pub mod input;
pub mod render;
pub mod settle;
pub mod shortcuts;
pub mod sync;

pub use backend::{
    GraphBackend, GraphStore, LiveGraph, Persist, QueuedStore, RequestId, StaticGraph, StoreError,
    StoreReply, StoreRequest,
};
pub use bus::{EventLog, Scene, SubscriptionId, SyncBus, SyncEvent, SyncListener};
pub use config::{EditorConfig, SettleConfig};
pub use drag::{Committed, DragController, DragEffect, DragSession, Provisional};
pub use input::{DragTarget, HitTarget, InputEvent};
pub use render::{RenderService, ViewBinding};
pub use settle::{SettleRun, SettleStatus};
pub use shortcuts::{EditorAction, ShortcutMap};
pub use sync::Editor;
