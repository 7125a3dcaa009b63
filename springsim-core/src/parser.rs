use crate::command::Command;
use crate::diagnostics::Span;
use crate::integrator::IntegrationMethod;
use glam::Vec3;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
    #[error("Unrecognized command: {text}")]
    UnknownCommand { text: String, span: Option<Span> },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } | Self::UnknownCommand { span, .. } => *span,
        }
    }
}

/// One non-blank, non-comment line of a script
#[derive(Debug)]
pub struct ScriptLine {
    /// Zero-based line number
    pub line: usize,
    pub text: String,
    pub command: Result<Command, ParseError>,
}

/// Split a script into parsed lines. Blank lines and `#` comments are
/// skipped; bad lines are kept with their error so the caller can report
/// them and carry on.
pub fn parse_script(source: &str) -> Vec<ScriptLine> {
    let mut out = Vec::new();
    let mut offset = 0;
    for (line, raw) in source.split('\n').enumerate() {
        let span = Span::new(offset, offset + raw.len());
        offset += raw.len() + 1;

        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        out.push(ScriptLine {
            line,
            text: text.to_string(),
            command: parse_line(text, Some(span)),
        });
    }
    out
}

/// Parse a single command line
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    parse_line(line.trim(), None)
}

fn parse_line(line: &str, span: Option<Span>) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let args = Args {
        line,
        tokens: &tokens,
        span,
    };

    match tokens.as_slice() {
        ["add", "point", ..] => {
            args.expect_len(8)?;
            Ok(Command::AddPoint {
                position: args.vec3(2)?,
                tangent: args.vec3(5)?,
            })
        }
        ["set", "point", ..] => {
            args.expect_len(6)?;
            Ok(Command::SetPoint {
                index: args.index(2)?,
                position: args.vec3(3)?,
            })
        }
        ["set", "tangent", ..] => {
            args.expect_len(6)?;
            Ok(Command::SetTangent {
                index: args.index(2)?,
                tangent: args.vec3(3)?,
            })
        }
        ["create", "particles", ..] => {
            args.expect_len(3)?;
            Ok(Command::CreateParticles(args.index(2)?))
        }
        ["create", "springs", ..] => {
            args.expect_len(3)?;
            Ok(Command::CreateSprings(args.index(2)?))
        }
        ["particle", ..] => {
            args.expect_len(9)?;
            Ok(Command::Particle {
                index: args.index(1)?,
                mass: args.number(2)?,
                position: args.vec3(3)?,
                velocity: args.vec3(6)?,
            })
        }
        ["all_velocities", ..] => {
            args.expect_len(4)?;
            Ok(Command::AllVelocities(args.vec3(1)?))
        }
        ["link", ..] => {
            args.expect_len(7)?;
            Ok(Command::Link {
                spring: args.index(1)?,
                p1: args.index(2)?,
                p2: args.index(3)?,
                ks: args.number(4)?,
                kd: args.number(5)?,
                rest_length: args.number(6)?,
            })
        }
        ["ground", ..] => {
            args.expect_len(3)?;
            Ok(Command::Ground {
                elasticity: args.number(1)?,
                viscosity: args.number(2)?,
            })
        }
        ["gravity", ..] => {
            args.expect_len(2)?;
            Ok(Command::Gravity(args.number(1)?))
        }
        ["integration", ..] => {
            args.expect_len(3)?;
            let method: IntegrationMethod = tokens[1]
                .parse()
                .map_err(|msg: String| ParseError::new(msg, span))?;
            Ok(Command::Integration {
                method,
                dt: args.number(2)?,
            })
        }
        ["friction", ..] => {
            args.expect_len(3)?;
            Ok(Command::Friction {
                static_friction: args.number(1)?,
                kinetic_friction: args.number(2)?,
            })
        }
        ["drive", _] => Ok(Command::Drive {
            index: args.index(1)?,
            speed: None,
        }),
        ["drive", ..] => {
            args.expect_len(3)?;
            Ok(Command::Drive {
                index: args.index(1)?,
                speed: Some(args.number(2)?),
            })
        }
        _ => Err(ParseError::UnknownCommand {
            text: line.to_string(),
            span,
        }),
    }
}

/// Positional access to the tokens of one line
struct Args<'a> {
    line: &'a str,
    tokens: &'a [&'a str],
    span: Option<Span>,
}

impl Args<'_> {
    fn expect_len(&self, len: usize) -> Result<(), ParseError> {
        if self.tokens.len() == len {
            Ok(())
        } else {
            Err(ParseError::new(
                format!(
                    "Expected {} arguments, found {}: {}",
                    len - 1,
                    self.tokens.len() - 1,
                    self.line
                ),
                self.span,
            ))
        }
    }

    fn number(&self, at: usize) -> Result<f32, ParseError> {
        let token = self.tokens[at];
        token
            .parse::<f32>()
            .map_err(|_| ParseError::new(format!("Invalid number '{}': {}", token, self.line), self.span))
    }

    fn index(&self, at: usize) -> Result<usize, ParseError> {
        let token = self.tokens[at];
        token
            .parse::<usize>()
            .map_err(|_| ParseError::new(format!("Invalid index '{}': {}", token, self.line), self.span))
    }

    fn vec3(&self, at: usize) -> Result<Vec3, ParseError> {
        Ok(Vec3::new(
            self.number(at)?,
            self.number(at + 1)?,
            self.number(at + 2)?,
        ))
    }
}
