#![no_main]

use libfuzzer_sys::fuzz_target;
use panorama::charts::default_hover_notes;
use panorama::layout::SourceLayout;
use panorama::output::Output;
use panorama::page::Theme;
use panorama::{run_dashboard, DashboardFlags};
use std::io;
use std::io::{BufReader, Cursor, Write};

fuzz_target!(|data: &[u8]| {
    // the same bytes stand in for both source files
    let _run = run_dashboard(
        BufReader::new(Cursor::new(data)),
        BufReader::new(Cursor::new(data)),
        FuzzOutput,
        &SourceLayout::default(),
        &default_hover_notes(),
        &Theme::default(),
        DashboardFlags::all(),
    );
});

#[derive(Debug, Default)]
pub struct FuzzOutput;

impl Output for FuzzOutput {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        // not a no-op, so the writers run too
        false
    }
}
