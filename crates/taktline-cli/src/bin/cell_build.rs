//! One build cell pulse.

use taktline_cli::kind::PulseKind;

fn main() {
    taktline_cli::pulse_main(PulseKind::Build);
}
