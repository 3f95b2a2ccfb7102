//! Crossterm rendering: the alternate screen and a [`RenderSink`] that paints
//! each run at its cell position in its own color.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use unicode_width::UnicodeWidthChar;

use subtick_core::{Frame, RenderSink, Rgb, TextMeasure};

/// Display width in terminal cells.
#[derive(Debug, Default, Clone, Copy)]
pub struct CellMeasure;

impl TextMeasure for CellMeasure {
    fn char_width(&self, c: char) -> u32 {
        c.width().unwrap_or(0) as u32
    }
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r(),
        g: rgb.g(),
        b: rgb.b(),
    }
}

/// Repaints the whole frame on every redraw.
///
/// A write failure is logged once; later frames are still attempted so the
/// display recovers if the terminal does.
#[derive(Debug)]
pub struct TerminalSink<W: Write> {
    out: W,
    failing: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            failing: false,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        for (y, line) in frame.rows() {
            let row = clamp_u16(y);
            for run in line.runs() {
                queue!(
                    self.out,
                    MoveTo(clamp_u16(run.start_x()), row),
                    SetForegroundColor(to_color(run.color())),
                    Print(run.text())
                )?;
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn redraw(&mut self, frame: &Frame<'_>) {
        match self.paint(frame) {
            Ok(()) => self.failing = false,
            Err(e) => {
                if !self.failing {
                    tracing::warn!(error = %e, "Terminal write failed");
                }
                self.failing = true;
            }
        }
    }
}

fn clamp_u16(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// Raw mode plus alternate screen for as long as it lives.
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Best-effort return to the normal screen. Safe to call more than once.
pub fn restore_terminal() {
    let _ = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}
