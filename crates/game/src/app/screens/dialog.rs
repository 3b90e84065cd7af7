use quest_engine::{
    InputAction, InputSnapshot, LaunchInfo, QuestionDef, Screen, ScreenContext, ScreenEvent,
    TimerId,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

pub(crate) const DIALOG_FINISHED: &str = "dialog_finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Line(usize),
    Question { cursor: usize },
    Done,
}

/// Speech bubble over a room. Lines advance on interact or after the
/// speaker's line delay; a question then waits for an answer.
///
/// The parent receives one `dialog_finished` event carrying the speaker and,
/// when a question was asked, the chosen answer and its score.
pub(crate) struct DialogScreen {
    speaker: String,
    lines: Vec<String>,
    line_seconds: Option<f32>,
    question: Option<QuestionDef>,
    stage: Stage,
    timer: Option<TimerId>,
}

impl DialogScreen {
    pub(crate) fn new() -> Self {
        Self {
            speaker: String::new(),
            lines: Vec::new(),
            line_seconds: None,
            question: None,
            stage: Stage::Done,
            timer: None,
        }
    }

    fn show_line(&mut self, index: usize, ctx: &mut ScreenContext<'_>) {
        self.stage = Stage::Line(index);
        if let Some(seconds) = self.line_seconds {
            self.timer = Some(ctx.after(seconds));
        }
    }

    fn advance(&mut self, ctx: &mut ScreenContext<'_>) {
        if let Some(timer) = self.timer.take() {
            ctx.cancel_timer(timer);
        }
        let Stage::Line(index) = self.stage else {
            return;
        };
        if index + 1 < self.lines.len() {
            self.show_line(index + 1, ctx);
        } else if self.question.is_some() {
            self.stage = Stage::Question { cursor: 0 };
        } else {
            self.finish(None, ctx);
        }
    }

    fn finish(&mut self, answer: Option<usize>, ctx: &mut ScreenContext<'_>) {
        self.stage = Stage::Done;
        if let Some(timer) = self.timer.take() {
            ctx.cancel_timer(timer);
        }
        let score = answer.and_then(|index| {
            self.question
                .as_ref()
                .and_then(|question| question.answers.get(index))
                .map(|answer| answer.score)
        });
        info!(speaker = %self.speaker, answer = ?answer, score = ?score, "dialog_finished");
        ctx.notify_parent(ScreenEvent::Custom {
            name: DIALOG_FINISHED.to_string(),
            data: json!({ "speaker": self.speaker, "answer": answer, "score": score }),
        });
        ctx.close_overlay();
    }
}

impl Screen for DialogScreen {
    fn load(&mut self, ctx: &mut ScreenContext<'_>, launch: &LaunchInfo) {
        self.speaker = launch
            .payload
            .get("speaker")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let content = ctx.content();
        let Some(speaker) = content.speaker(&self.speaker) else {
            warn!(speaker = %self.speaker, "dialog_speaker_missing");
            self.finish(None, ctx);
            return;
        };
        self.lines = speaker.lines.clone();
        self.line_seconds = speaker.line_seconds;
        self.question = speaker.question.clone();

        if self.lines.is_empty() {
            self.stage = Stage::Question { cursor: 0 };
        } else {
            self.show_line(0, ctx);
        }
        debug!(speaker = %self.speaker, lines = self.lines.len(), "dialog_opened");
    }

    fn update(&mut self, _dt_seconds: f32, input: &InputSnapshot, ctx: &mut ScreenContext<'_>) {
        match self.stage {
            Stage::Done => {}
            Stage::Line(_) => {
                if input.just_pressed(InputAction::Interact) {
                    self.advance(ctx);
                }
            }
            Stage::Question { cursor } => {
                let answers = self
                    .question
                    .as_ref()
                    .map_or(0, |question| question.answers.len());
                if input.just_pressed(InputAction::MoveUp) {
                    self.stage = Stage::Question {
                        cursor: cursor.saturating_sub(1),
                    };
                } else if input.just_pressed(InputAction::MoveDown) && cursor + 1 < answers {
                    self.stage = Stage::Question { cursor: cursor + 1 };
                } else if input.just_pressed(InputAction::Interact) {
                    self.finish(Some(cursor), ctx);
                }
            }
        }
    }

    fn on_timer(&mut self, timer: TimerId, ctx: &mut ScreenContext<'_>) {
        if self.timer == Some(timer) {
            self.timer = None;
            self.advance(ctx);
        }
    }

    fn debug_title(&self) -> Option<String> {
        let text = match self.stage {
            Stage::Line(index) => self.lines.get(index).cloned().unwrap_or_default(),
            Stage::Question { cursor } => match &self.question {
                Some(question) => {
                    let answer = question
                        .answers
                        .get(cursor)
                        .map_or("-", |answer| answer.text.as_str());
                    format!("{} [{answer}]", question.text)
                }
                None => String::new(),
            },
            Stage::Done => String::new(),
        };
        Some(format!("dialog | {}: {text}", self.speaker))
    }
}
