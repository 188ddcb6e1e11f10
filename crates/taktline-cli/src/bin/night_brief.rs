//! Evening routine: daily metrics, log rotation, evening brief.

use taktline_cli::kind::PulseKind;

fn main() {
    taktline_cli::pulse_main(PulseKind::NightBrief);
}
