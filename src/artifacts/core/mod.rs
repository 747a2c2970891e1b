//! Pager plumbing for long output (`log`)

use derive_new::new;
use is_terminal::IsTerminal;
use minus::Pager;
use std::io::{self, Write};

/// Set (to any value) to print straight to stdout instead of paging
pub const NO_PAGER_ENV: &str = "NO_PAGER";

/// Whether long output should go through the pager
///
/// Only when stdout is a terminal and `NO_PAGER` is unset.
pub fn should_page() -> bool {
    std::env::var_os(NO_PAGER_ENV).is_none() && io::stdout().is_terminal()
}

/// `Write` adapter feeding the minus pager
///
/// ```ignore
/// let pager = Pager::new();
/// let writer = PagerWriter::new(pager.clone());
/// let repository = Repository::discover(&pwd, Box::new(writer))?;
/// repository.print_log(None, &options)?;
/// minus::page_all(pager)?;
/// ```
#[derive(new, Clone)]
pub struct PagerWriter {
    pager: Pager,
}

impl PagerWriter {
    pub fn pager(&self) -> &Pager {
        &self.pager
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut writer = PagerWriter::new(Pager::new());

        let error = writer.write(&[0xff, 0xfe]).unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn text_is_accepted_whole() {
        let mut writer = PagerWriter::new(Pager::new());

        assert_eq!(writer.write(b"commit abc\n").unwrap(), 11);
    }
}
