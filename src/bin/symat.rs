use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(expr) = env::args().nth(1) else {
        eprintln!("usage: symat \"<expression>[; declarations…]\"");
        return ExitCode::FAILURE;
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    // the iteration log already ends with the converged form
    match symat::simplify_to(&expr, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
