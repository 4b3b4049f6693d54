use lox_lang::{
    config::{Action, Config, DiagnosticStyle, Mode},
    diagnostics::{emit_diagnostics, report_io_error},
    logging,
    session::{dump_ast, dump_tokens, RunReport, Session},
};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::Path,
    process::ExitCode,
};

const EX_USAGE: u8 = 64;
const EX_NOINPUT: u8 = 66;

fn main() -> ExitCode {
    logging::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(EX_USAGE);
        }
    };

    match &config.mode {
        Mode::Script(path) => run_file(path, config.action, config.style),
        Mode::Prompt => run_prompt(config.action, config.style),
    }
}

fn run_file(path: &Path, action: Action, style: DiagnosticStyle) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            report_io_error(path, &err);
            return ExitCode::from(EX_NOINPUT);
        }
    };

    let mut session = Session::new();
    let report = execute(&mut session, &source, action);
    let _ = io::stdout().flush();
    emit_diagnostics(
        &report.diagnostics,
        style,
        &path.display().to_string(),
        &source,
    );
    ExitCode::from(report.outcome.exit_code())
}

fn run_prompt(action: Action, style: DiagnosticStyle) -> ExitCode {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                eprintln!("Failed to read input: {err}");
                break;
            }
            None => break,
        };
        let report = execute(&mut session, &line, action);
        let _ = io::stdout().flush();
        emit_diagnostics(&report.diagnostics, style, "<prompt>", &line);
    }

    ExitCode::SUCCESS
}

fn execute(session: &mut Session, source: &str, action: Action) -> RunReport {
    match action {
        Action::Run => session.run(source),
        Action::Tokens => print_dump(dump_tokens(source)),
        Action::PrintAst => print_dump(dump_ast(source)),
    }
}

fn print_dump((text, report): (String, RunReport)) -> RunReport {
    print!("{text}");
    report
}
