pub mod activity;
pub mod listener;
pub mod processes;

pub use activity::{ActivitySampler, NoWindowTitles, WindowTitleSource};
pub use listener::spawn_input_listener;
pub use processes::{ProcessSource, SysinfoProcesses};
