pub mod canvas;
pub mod generation;
pub mod input;
pub mod interaction;
pub mod mutation;
pub mod notify;
pub mod shortcuts;

pub use canvas::{Canvas, Changes, GenerationOutcome, QuickAddRequest, WidgetFocus, starter_graph};
pub use generation::{
    Discard, GenerationError, GenerationGate, GenerationRequest, GenerationResponse,
    GenerationTicket, SuggestionRequest, SuggestionResponse, filter_suggestions,
};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{Effect, InteractionMachine, Session};
pub use mutation::{GraphMutation, GraphStore, MutationError};
pub use notify::{Clock, ManualClock, Notification, Notifier, NullNotifier, Toast, ToastQueue, Variant};
pub use shortcuts::{ShortcutAction, ShortcutMap};

#[cfg(not(target_arch = "wasm32"))]
pub use notify::SystemClock;
