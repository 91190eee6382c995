mod validator;

use clap::Parser;
use miette::{Diagnostic, Result};
use radmath::{
    Engine, MathLoopData, render_error,
    scope::memory::{ArrayField, MemoryScope},
};
use radmath_core::parser;
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    ExampleHighlighter, IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use std::io::BufRead;
use std::io::BufReader;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::validator::ScriptValidator;

/// Radmath - field arithmetic for gridded and radar data
#[derive(Parser, Debug)]
#[command(name = "radmath")]
#[command(about = "Run radmath scripts against fields given on the command line", long_about = None)]
struct Args {
    /// Input field as NAME=v1,v2,... (use `missing` for a missing point)
    #[arg(short, long = "field", value_name = "NAME=VALUES")]
    fields: Vec<String>,

    /// Sentinel value that marks missing points
    #[arg(long, default_value_t = -9999.0, allow_negative_numbers = true)]
    missing: f64,

    /// Read the script from a file
    #[arg(long, value_name = "PATH", conflicts_with = "script")]
    file: Option<PathBuf>,

    /// Stop at the first failing statement
    #[arg(long)]
    stop_on_error: bool,

    /// List the built-in functions and exit
    #[arg(long)]
    list_functions: bool,

    /// Print the parsed statements (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Script to run (if not provided, reads from stdin)
    script: Option<String>,
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("invalid field '{0}'")]
    #[diagnostic(help("fields are written NAME=v1,v2,..."))]
    FieldSyntax(String),

    #[error("invalid value '{value}' in field '{field}'")]
    FieldValue { field: String, value: String },

    #[error("cannot add field: {0}")]
    Scope(#[from] radmath::EvalError),

    #[error("cannot read script '{path}'")]
    ReadScript {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse `NAME=v1,v2,...`. `missing` (or an empty entry) becomes the
/// sentinel.
fn parse_field(spec: &str, missing: f64) -> Result<ArrayField, CliError> {
    let (name, values) = spec
        .split_once('=')
        .ok_or_else(|| CliError::FieldSyntax(spec.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::FieldSyntax(spec.to_string()));
    }
    let values = values
        .split(',')
        .map(|v| match v.trim() {
            "" | "missing" => Ok(missing),
            text => text.parse::<f64>().map_err(|_| CliError::FieldValue {
                field: name.to_string(),
                value: text.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ArrayField::with_missing(name, values, missing))
}

fn build_scope(args: &Args) -> Result<MemoryScope<'static>, CliError> {
    let mut scope = MemoryScope::new();
    for spec in &args.fields {
        scope.add_field(parse_field(spec, args.missing)?)?;
    }
    Ok(scope)
}

fn print_functions(engine: &Engine) {
    for def in engine.builtin_functions() {
        println!("{}", def);
    }
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline(engine: &Engine, scope: &MemoryScope<'_>) -> (Reedline, DefaultPrompt) {
    // Complete built-in keywords and the names of the input fields.
    let mut words: Vec<String> = engine
        .builtin_functions()
        .iter()
        .map(|def| def.name().split('(').next().unwrap_or_default().to_string())
        .collect();
    words.extend(scope.field_names().into_iter().map(str::to_string));

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['_']);
        completions.insert(words.clone());
        completions
    });

    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let completion_menu = Box::new(ide_menu);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let edit_mode = Box::new(Emacs::new(keybindings));

    let line_editor = Reedline::create()
        .with_highlighter(Box::new(ExampleHighlighter::new(words)))
        .with_completer(completer)
        .with_validator(Box::new(ScriptValidator))
        .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
        .with_edit_mode(edit_mode);

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("radmath".to_string()),
        DefaultPromptSegment::Empty,
    );

    (line_editor, prompt)
}

/// Compile and run `input` against `scope`, then print what it produced.
fn interpret_input(engine: &Engine, scope: &mut MemoryScope<'_>, input: &str, debug_parse: bool) {
    if debug_parse {
        match parser::parse(input) {
            Ok(statements) => {
                println!("=== Parsed statements ===");
                for statement in &statements {
                    println!("{:#?}", statement);
                }
                println!();
            }
            Err(e) => {
                render_error(&e.into());
                return;
            }
        }
    }

    let script = match engine.compile(input) {
        Ok(script) => script,
        Err(e) => {
            render_error(&e);
            return;
        }
    };

    debug!(statements = script.statements().len(), inputs = ?script.inputs(), "running script");
    let report = script.run(scope);
    for (statement, error) in report.failures() {
        eprintln!("error: {}: {}", statement, error);
    }
    if report.stopped_early {
        eprintln!("stopped after {} statement(s)", report.statements.len());
    }

    for name in report.produced() {
        if let Some(field) = scope.array(name) {
            let mut line = String::new();
            if field.print(&mut line).is_ok() {
                print!("{}", line);
            }
        } else if let Some(data) = scope.special().matching_data(name) {
            println!("{} {:?}", name, data);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG to control log level; default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut options = radmath::EngineOptions::default();
    options.default_execution_options.stop_on_error = args.stop_on_error;
    let engine = Engine::new(options);

    if args.list_functions {
        print_functions(&engine);
        return Ok(());
    }

    let mut scope = build_scope(&args)?;

    if let Some(path) = &args.file {
        let script = std::fs::read_to_string(path).map_err(|source| CliError::ReadScript {
            path: path.display().to_string(),
            source,
        })?;
        interpret_input(&engine, &mut scope, &script, args.debug_parse);
        return Ok(());
    }

    // Check if we have a direct script argument
    if let Some(script) = &args.script {
        interpret_input(&engine, &mut scope, script, args.debug_parse);
        return Ok(());
    }

    // Otherwise, check if we're in interactive or pipe mode
    let is_interactive = atty::is(atty::Stream::Stdin);

    if is_interactive {
        // Interactive REPL mode; the scope persists between lines.
        let (mut line_editor, prompt) = setup_reedline(&engine, &scope);

        println!("radmath REPL - enter statements to run (Ctrl+D or Ctrl+C to exit)");

        loop {
            let sig = match line_editor.read_line(&prompt) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Reedline error: {e}");
                    return Ok(());
                }
            };

            match sig {
                Signal::Success(buffer) => {
                    interpret_input(&engine, &mut scope, buffer.as_ref(), args.debug_parse);
                }
                Signal::CtrlD | Signal::CtrlC => {
                    println!("\nGoodbye!");
                    return Ok(());
                }
            }
        }
    } else {
        // Pipe/stdin mode
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading line from stdin: {}", e);
                    return Ok(());
                }
            };

            interpret_input(&engine, &mut scope, &line, args.debug_parse);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_field() {
        let field = parse_field("DBZ=10, missing,40,", -1.0).unwrap();
        assert_eq!(field.name(), "DBZ");
        assert_eq!(field.values(), &[10.0, -1.0, 40.0, -1.0]);
    }

    #[test]
    fn test_parse_field_errors() {
        assert!(matches!(parse_field("DBZ", -1.0), Err(CliError::FieldSyntax(_))));
        assert!(matches!(parse_field("=1,2", -1.0), Err(CliError::FieldSyntax(_))));
        assert!(matches!(
            parse_field("DBZ=1,x", -1.0),
            Err(CliError::FieldValue { ref value, .. }) if value == "x"
        ));
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from([
            "radmath",
            "-f",
            "DBZ=10,missing,40",
            "--field",
            "VEL=1,2,3",
            "--missing",
            "-32768",
            "SNR = DBZ - 5",
        ]);
        assert_eq!(args.fields.len(), 2);
        assert_eq!(args.missing, -32768.0);
        assert_eq!(args.script.as_deref(), Some("SNR = DBZ - 5"));

        let scope = build_scope(&args).unwrap();
        assert_eq!(scope.field_names(), vec!["DBZ", "VEL"]);
        assert_eq!(scope.array("DBZ").unwrap().values()[1], -32768.0);
    }

    #[test]
    fn test_mismatched_field_lengths() {
        let args = Args::parse_from(["radmath", "-f", "A=1,2", "-f", "B=1"]);
        assert!(matches!(build_scope(&args), Err(CliError::Scope(_))));
    }
}
