mod call_handle;
mod call_session;
mod session_command;
mod session_event;

pub use call_handle::CallHandle;
pub use call_session::CallSession;
pub use session_command::SessionCommand;
pub use session_event::SessionEvent;
