//! SVG path data parser
//!
//! Parses the `d` attribute mini-language into absolute commands:
//! relative coordinates are resolved, `H`/`V` become lines and the smooth
//! curve forms get their reflected control points. Arcs stay arcs here;
//! lowering them to cubics is up to the consumer.
//!
//! Arc flags are single characters, so `a1 1 0 0017 7` reads as
//! `large=0 sweep=0` followed by `17 7`.

use strata_core::Point;

use crate::{PaintError, Result};

/// Absolute path-data command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SvgCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    ArcTo {
        rx: f32,
        ry: f32,
        /// Degrees
        x_rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

/// Parse path data into absolute commands
pub fn parse_path_data(data: &str) -> Result<Vec<SvgCommand>> {
    Parser::new(data).parse()
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    commands: Vec<SvgCommand>,
    pen: Point,
    subpath_start: Point,
    /// Second control point of the previous cubic, for `S`
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic, for `T`
    last_quad: Option<Point>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            commands: Vec::new(),
            pen: Point::ZERO,
            subpath_start: Point::ZERO,
            last_cubic: None,
            last_quad: None,
        }
    }

    fn error(&self, message: impl Into<String>) -> PaintError {
        PaintError::PathSyntax {
            position: self.pos,
            message: message.into(),
        }
    }

    fn parse(mut self) -> Result<Vec<SvgCommand>> {
        self.skip_separators();
        let mut previous: Option<u8> = None;
        while self.pos < self.input.len() {
            let command = match self.input[self.pos] {
                c if c.is_ascii_alphabetic() => {
                    self.pos += 1;
                    c
                }
                // Implicit repetition of the previous command
                _ => match previous {
                    Some(b'M') => b'L',
                    Some(b'm') => b'l',
                    Some(b'Z' | b'z') | None => {
                        return Err(self.error("expected a command letter"));
                    }
                    Some(c) => c,
                },
            };
            if previous.is_none() && !matches!(command, b'M' | b'm') {
                return Err(self.error("path data must start with a move command"));
            }
            self.command(command)?;
            previous = Some(command);
            self.skip_separators();
        }
        Ok(self.commands)
    }

    fn command(&mut self, command: u8) -> Result<()> {
        let relative = command.is_ascii_lowercase();
        let origin = if relative { self.pen } else { Point::ZERO };
        let at = |x: f32, y: f32| Point::new(origin.x + x, origin.y + y);

        let mut reset_cubic = true;
        let mut reset_quad = true;
        match command.to_ascii_uppercase() {
            b'M' => {
                let p = at(self.number()?, self.number()?);
                self.commands.push(SvgCommand::MoveTo(p));
                self.pen = p;
                self.subpath_start = p;
            }
            b'L' => {
                let p = at(self.number()?, self.number()?);
                self.line(p);
            }
            b'H' => {
                let x = self.number()?;
                let x = if relative { self.pen.x + x } else { x };
                self.line(Point::new(x, self.pen.y));
            }
            b'V' => {
                let y = self.number()?;
                let y = if relative { self.pen.y + y } else { y };
                self.line(Point::new(self.pen.x, y));
            }
            b'C' => {
                let control1 = at(self.number()?, self.number()?);
                let control2 = at(self.number()?, self.number()?);
                let end = at(self.number()?, self.number()?);
                self.cubic(control1, control2, end);
                reset_cubic = false;
            }
            b'S' => {
                let control1 = reflect(self.last_cubic, self.pen);
                let control2 = at(self.number()?, self.number()?);
                let end = at(self.number()?, self.number()?);
                self.cubic(control1, control2, end);
                reset_cubic = false;
            }
            b'Q' => {
                let control = at(self.number()?, self.number()?);
                let end = at(self.number()?, self.number()?);
                self.quad(control, end);
                reset_quad = false;
            }
            b'T' => {
                let control = reflect(self.last_quad, self.pen);
                let end = at(self.number()?, self.number()?);
                self.quad(control, end);
                reset_quad = false;
            }
            b'A' => {
                let rx = self.number()?;
                let ry = self.number()?;
                let x_rotation = self.number()?;
                let large_arc = self.flag()?;
                let sweep = self.flag()?;
                let end = at(self.number()?, self.number()?);
                self.commands.push(SvgCommand::ArcTo {
                    rx,
                    ry,
                    x_rotation,
                    large_arc,
                    sweep,
                    end,
                });
                self.pen = end;
            }
            b'Z' => {
                self.commands.push(SvgCommand::Close);
                self.pen = self.subpath_start;
            }
            other => {
                self.pos -= 1;
                return Err(self.error(format!("unknown command '{}'", other as char)));
            }
        }
        if reset_cubic {
            self.last_cubic = None;
        }
        if reset_quad {
            self.last_quad = None;
        }
        Ok(())
    }

    fn line(&mut self, p: Point) {
        self.commands.push(SvgCommand::LineTo(p));
        self.pen = p;
    }

    fn cubic(&mut self, control1: Point, control2: Point, end: Point) {
        self.commands.push(SvgCommand::CubicTo {
            control1,
            control2,
            end,
        });
        self.last_cubic = Some(control2);
        self.pen = end;
    }

    fn quad(&mut self, control: Point, end: Point) {
        self.commands.push(SvgCommand::QuadTo { control, end });
        self.last_quad = Some(control);
        self.pen = end;
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Whitespace with at most one comma
    fn skip_separators(&mut self) {
        self.skip_whitespace();
        if self.input.get(self.pos) == Some(&b',') {
            self.pos += 1;
            self.skip_whitespace();
        }
    }

    fn flag(&mut self) -> Result<bool> {
        self.skip_separators();
        let flag = match self.input.get(self.pos) {
            Some(b'0') => false,
            Some(b'1') => true,
            _ => return Err(self.error("expected arc flag 0 or 1")),
        };
        self.pos += 1;
        Ok(flag)
    }

    fn number(&mut self) -> Result<f32> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.input;
        let mut end = self.pos;

        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let mut digits = 0;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
            digits += 1;
        }
        if bytes.get(end) == Some(&b'.') {
            end += 1;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return Err(self.error("expected a number"));
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
                exp_end += 1;
            }
            let exp_digits_start = exp_end;
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            if exp_end > exp_digits_start {
                end = exp_end;
            }
        }

        let text = std::str::from_utf8(&bytes[start..end]).map_err(|_| self.error("invalid number"))?;
        let value = text
            .parse::<f32>()
            .map_err(|_| self.error(format!("invalid number '{text}'")))?;
        self.pos = end;
        Ok(value)
    }
}

fn reflect(control: Option<Point>, pen: Point) -> Point {
    match control {
        Some(c) => Point::new(2.0 * pen.x - c.x, 2.0 * pen.y - c.y),
        None => pen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_triangle() {
        let commands = parse_path_data("M0 0 L10 0 L10 10 Z").unwrap();
        assert_eq!(
            commands,
            vec![
                SvgCommand::MoveTo(p(0.0, 0.0)),
                SvgCommand::LineTo(p(10.0, 0.0)),
                SvgCommand::LineTo(p(10.0, 10.0)),
                SvgCommand::Close,
            ]
        );
    }

    #[test]
    fn test_relative_and_implicit_lines() {
        let commands = parse_path_data("m5,5 10,0 0,10 h-10 v-5 z").unwrap();
        assert_eq!(
            commands,
            vec![
                SvgCommand::MoveTo(p(5.0, 5.0)),
                SvgCommand::LineTo(p(15.0, 5.0)),
                SvgCommand::LineTo(p(15.0, 15.0)),
                SvgCommand::LineTo(p(5.0, 15.0)),
                SvgCommand::LineTo(p(5.0, 10.0)),
                SvgCommand::Close,
            ]
        );
    }

    #[test]
    fn test_compact_numbers() {
        let commands = parse_path_data("M.5.5L-1-2e1").unwrap();
        assert_eq!(commands[0], SvgCommand::MoveTo(p(0.5, 0.5)));
        assert_eq!(commands[1], SvgCommand::LineTo(p(-1.0, -20.0)));
    }

    #[test]
    fn test_concatenated_arc_flags() {
        let commands = parse_path_data("M0 0a1 1 0 0017 7").unwrap();
        assert_eq!(
            commands[1],
            SvgCommand::ArcTo {
                rx: 1.0,
                ry: 1.0,
                x_rotation: 0.0,
                large_arc: false,
                sweep: false,
                end: p(17.0, 7.0),
            }
        );

        let commands = parse_path_data("M0 0A5 5 30 1,1 10 0").unwrap();
        assert!(matches!(
            commands[1],
            SvgCommand::ArcTo {
                large_arc: true,
                sweep: true,
                ..
            }
        ));
    }

    #[test]
    fn test_smooth_curves_reflect_controls() {
        let commands = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
        assert_eq!(
            commands[2],
            SvgCommand::CubicTo {
                control1: p(10.0, -10.0),
                control2: p(20.0, -10.0),
                end: p(20.0, 0.0),
            }
        );

        let commands = parse_path_data("M0 0 Q5 10 10 0 T20 0").unwrap();
        assert_eq!(
            commands[2],
            SvgCommand::QuadTo {
                control: p(15.0, -10.0),
                end: p(20.0, 0.0),
            }
        );

        // Without a preceding cubic the reflected control is the pen
        let commands = parse_path_data("M1 1 S5 5 6 6").unwrap();
        assert!(matches!(
            commands[1],
            SvgCommand::CubicTo { control1, .. } if control1 == p(1.0, 1.0)
        ));
    }

    #[test]
    fn test_close_returns_pen_to_subpath_start() {
        let commands = parse_path_data("M10 10 l5 0 z l0 5").unwrap();
        assert_eq!(commands[3], SvgCommand::LineTo(p(10.0, 15.0)));
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_path_data("L10 10").is_err());
        assert!(parse_path_data("M0 0 L10").is_err());
        assert!(parse_path_data("M0 0 X5 5").is_err());
        assert!(parse_path_data("M0 0 A1 1 0 2 0 5 5").is_err());
        let err = parse_path_data("M0 0 Lx").unwrap_err();
        assert!(matches!(err, PaintError::PathSyntax { position: 6, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_path_data("").unwrap().is_empty());
        assert!(parse_path_data("   ").unwrap().is_empty());
    }
}
