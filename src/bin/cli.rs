use vigil::logger::init_logging;
use vigil::uci;

fn main() {
    // Opt-in file logging; stdout stays clean for the protocol.
    if let Ok(path) = std::env::var("VIGIL_LOG") {
        init_logging(path, "info");
    }

    let exit_code = uci::run();
    std::process::exit(exit_code);
}
