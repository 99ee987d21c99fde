use std::io::Write;

use flexi_logger::{DeferredNow, style};
use log::{Level, Record};

/// `LEVEL message`, with the module path appended at debug and below.
pub fn cli_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(w, "{} {}", style(level).paint(level.as_str()), record.args())?;
    if level >= Level::Debug {
        write!(w, " [{}]", record.module_path().unwrap_or("<unnamed>"))?;
    }
    Ok(())
}
