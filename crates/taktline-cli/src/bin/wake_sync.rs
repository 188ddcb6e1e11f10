//! Morning routine: write the brief and the day's work queue.

use taktline_cli::kind::PulseKind;

fn main() {
    taktline_cli::pulse_main(PulseKind::WakeSync);
}
