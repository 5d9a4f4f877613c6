use eframe::egui::{Color32, Pos2, Stroke};

/// Minimal drawing API shared by the visible layer and the hit layer. Both
/// receive the same coordinates, so a pixel on one corresponds to the same
/// pixel on the other.
pub trait Surface {
    fn clear(&mut self);

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);

    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, outline: Stroke);
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Command {
        Clear,
        Line {
            from: Pos2,
            to: Pos2,
            stroke: Stroke,
        },
        Circle {
            center: Pos2,
            radius: f32,
            fill: Color32,
            outline: Stroke,
        },
    }

    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) commands: Vec<Command>,
    }

    impl RecordingSurface {
        pub(crate) fn circles(&self) -> Vec<(Pos2, f32, Color32)> {
            self.commands
                .iter()
                .filter_map(|command| match command {
                    Command::Circle {
                        center,
                        radius,
                        fill,
                        ..
                    } => Some((*center, *radius, *fill)),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn lines(&self) -> Vec<Stroke> {
            self.commands
                .iter()
                .filter_map(|command| match command {
                    Command::Line { stroke, .. } => Some(*stroke),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.commands.clear();
            self.commands.push(Command::Clear);
        }

        fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
            self.commands.push(Command::Line { from, to, stroke });
        }

        fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, outline: Stroke) {
            self.commands.push(Command::Circle {
                center,
                radius,
                fill,
                outline,
            });
        }
    }
}
