//! One takt beat: bump the tick, sample the cells, emit the cascade.

use taktline_cli::kind::PulseKind;

fn main() {
    taktline_cli::pulse_main(PulseKind::Takt);
}
