//! Command-line front-end: refine a matrix coloring read from standard input
//! or from a file given as the sole argument, writing the result to standard
//! output in the same textual format.

use std::error::Error;
use std::io::Read;
use std::process::ExitCode;

use weisfeiler::io::{parse_matrix, render_matrix};
use weisfeiler::refine;

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let input = match (args.next(), args.next()) {
        (None, _) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        (Some(path), None) => std::fs::read_to_string(&path)?,
        (Some(_), Some(_)) => return Err("usage: weisfeiler [matrix-file]".into()),
    };

    let (mut matrix, declared) = parse_matrix(&input)?;
    let palette = refine(&mut matrix, declared)?;
    print!("{}", render_matrix(&matrix, palette.total));
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("weisfeiler: {}", err);
            ExitCode::FAILURE
        }
    }
}
