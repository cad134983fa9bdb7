//! Native click injection.

use enigo::{Enigo, MouseButton, MouseControllable};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::InjectError;

// One Enigo handle per process; both hosts click through it.
static ENIGO: Lazy<Mutex<Enigo>> = Lazy::new(|| Mutex::new(Enigo::new()));

/// Sends one synthetic left press-and-release pair. Implementations must
/// deliver both events or report failure; a partial click is a failure.
pub trait ClickInjector {
    fn send_click(&mut self) -> Result<(), InjectError>;
}

/// Production injector backed by the OS input facility.
#[derive(Default)]
pub struct EnigoInjector;

impl EnigoInjector {
    pub fn new() -> Self {
        Self
    }
}

impl ClickInjector for EnigoInjector {
    fn send_click(&mut self) -> Result<(), InjectError> {
        let mut enigo = ENIGO.lock();
        enigo.mouse_down(MouseButton::Left);
        enigo.mouse_up(MouseButton::Left);
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use super::*;

    /// Counts clicks, failing after an optional budget is spent.
    pub struct FakeInjector {
        pub sent: u64,
        pub fail_after: Option<u64>,
    }

    impl ClickInjector for FakeInjector {
        fn send_click(&mut self) -> Result<(), InjectError> {
            if let Some(budget) = self.fail_after {
                if self.sent >= budget {
                    return Err(InjectError("synthetic event not delivered".into()));
                }
            }
            self.sent += 1;
            Ok(())
        }
    }
}
