use std::io;

use ratatui::{DefaultTerminal, Frame};

/// The viewer's hold on the terminal.
///
/// Created through `ratatui::try_init`, which enters raw mode and the
/// alternate screen and installs a panic hook that puts the terminal back.
/// Restored on drop if `restore` was not called.
pub struct Tui {
    terminal: DefaultTerminal,
    active: bool,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        let terminal = ratatui::try_init()?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Draw one frame
    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if std::mem::take(&mut self.active) {
            self.terminal.show_cursor()?;
            ratatui::try_restore()?;
        }
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
