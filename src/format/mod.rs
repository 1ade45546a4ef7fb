mod text;
mod time;

pub(crate) use text::format_note_line;
pub(crate) use time::format_display_time;
