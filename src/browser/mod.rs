mod session;

pub use session::{BrowserManager, PageSession};
