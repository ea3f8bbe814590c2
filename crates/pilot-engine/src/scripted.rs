//! An in-memory engine used by the demo binary and the behavioural tests.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use pilot_config::InputPoint;
use serde_json::Value;

use crate::control::EngineControl;
use crate::error::EngineError;
use crate::snapshot::{Choice, EngineIdentity, EngineSnapshot};

/// A small scripted visual-novel engine holding explicit state.
///
/// The state that the original bridge tracked through process-wide globals
/// (current speaker, dialogue, menu) lives here as plain fields, mutated
/// only through [`EngineControl`] calls on the owning thread.
#[derive(Debug)]
pub struct ScriptedEngine {
    game: String,
    label: Option<String>,
    speaker: Option<String>,
    dialogue: Option<String>,
    menu: Option<Vec<String>>,
    last_choice: Option<usize>,
    last_input: Option<InputPoint>,
    labels: BTreeSet<String>,
    variables: BTreeMap<String, Value>,
    dismiss_supported: bool,
    capture_supported: bool,
}

impl ScriptedEngine {
    /// Creates an engine hosting the named game, with no scene on screen.
    #[must_use]
    pub fn new(game: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            label: None,
            speaker: None,
            dialogue: None,
            menu: None,
            last_choice: None,
            last_input: None,
            labels: BTreeSet::new(),
            variables: BTreeMap::new(),
            dismiss_supported: true,
            capture_supported: true,
        }
    }

    /// Registers a jumpable script label.
    pub fn define_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.labels.insert(label.into());
        self
    }

    /// Puts a dialogue line on screen.
    pub fn show_line(
        &mut self,
        speaker: Option<impl Into<String>>,
        dialogue: impl Into<String>,
    ) -> &mut Self {
        self.speaker = speaker.map(Into::into);
        self.dialogue = Some(dialogue.into());
        self
    }

    /// Presents a choice menu with the given captions.
    pub fn present_menu<I, S>(&mut self, captions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.menu = Some(captions.into_iter().map(Into::into).collect());
        self
    }

    /// Seeds a variable without going through the settable checks.
    pub fn seed_variable(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Disables the logical dismiss action, forcing the synthetic-input
    /// fallback.
    pub fn without_dismiss(&mut self) -> &mut Self {
        self.dismiss_supported = false;
        self
    }

    /// Disables the engine capture API, forcing the OS-utility fallback.
    pub fn without_capture(&mut self) -> &mut Self {
        self.capture_supported = false;
        self
    }

    /// Index of the most recently selected choice.
    #[must_use]
    pub const fn last_choice(&self) -> Option<usize> {
        self.last_choice
    }

    /// Point of the most recently synthesized input.
    #[must_use]
    pub const fn last_input(&self) -> Option<InputPoint> {
        self.last_input
    }

    fn render_scene(&self) -> String {
        let mut scene = String::new();
        let _ = writeln!(scene, "game: {}", self.game);
        if let Some(label) = &self.label {
            let _ = writeln!(scene, "label: {label}");
        }
        if let Some(dialogue) = &self.dialogue {
            let speaker = self.speaker.as_deref().unwrap_or("narrator");
            let _ = writeln!(scene, "{speaker}: {dialogue}");
        }
        if let Some(menu) = &self.menu {
            for (index, caption) in menu.iter().enumerate() {
                let _ = writeln!(scene, "[{index}] {caption}");
            }
        }
        scene
    }
}

impl EngineControl for ScriptedEngine {
    fn identity(&self) -> EngineIdentity {
        EngineIdentity {
            engine: "scripted".to_owned(),
            game: self.game.clone(),
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            label: self.label.clone(),
            speaker: self.speaker.clone(),
            dialogue: self.dialogue.clone(),
            choices: self.choices(),
        }
    }

    fn choices(&self) -> Vec<Choice> {
        self.menu
            .as_deref()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, caption)| Choice {
                index,
                caption: caption.clone(),
            })
            .collect()
    }

    fn select_choice(&mut self, index: i64) -> Result<usize, EngineError> {
        let Some(menu) = self.menu.as_ref() else {
            return Err(EngineError::NoActiveChoice);
        };
        let count = menu.len();
        let chosen = usize::try_from(index)
            .ok()
            .filter(|i| *i < count)
            .ok_or(EngineError::ChoiceOutOfRange { index, count })?;
        self.menu = None;
        self.last_choice = Some(chosen);
        self.speaker = None;
        self.dialogue = None;
        Ok(chosen)
    }

    fn advance_dialogue(&mut self) -> Result<(), EngineError> {
        if !self.dismiss_supported {
            return Err(EngineError::Unsupported { feature: "dismiss" });
        }
        self.speaker = None;
        self.dialogue = None;
        Ok(())
    }

    fn synthesize_input(&mut self, point: Option<InputPoint>) -> Result<(), EngineError> {
        self.last_input = Some(point.unwrap_or(InputPoint { x: 640, y: 360 }));
        self.speaker = None;
        self.dialogue = None;
        Ok(())
    }

    fn read_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn write_variable(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        if name.is_empty() {
            return Err(EngineError::VariableNotSettable {
                name: name.to_owned(),
                reason: "name is empty".to_owned(),
            });
        }
        if name.starts_with('_') {
            return Err(EngineError::VariableNotSettable {
                name: name.to_owned(),
                reason: "names starting with '_' are reserved".to_owned(),
            });
        }
        self.variables.insert(name.to_owned(), value);
        Ok(())
    }

    fn capture_screenshot(&mut self, path: &Path) -> Result<(), EngineError> {
        if !self.capture_supported {
            return Err(EngineError::Unsupported {
                feature: "screenshot",
            });
        }
        fs::write(path, self.render_scene())
            .map_err(|error| EngineError::CaptureFailed(error.to_string()))
    }

    fn jump_to_label(&mut self, label: &str) -> Result<(), EngineError> {
        if !self.labels.contains(label) {
            return Err(EngineError::LabelNotFound {
                label: label.to_owned(),
            });
        }
        self.label = Some(label.to_owned());
        self.menu = None;
        self.speaker = None;
        self.dialogue = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn engine_with_menu() -> ScriptedEngine {
        let mut engine = ScriptedEngine::new("Test Story");
        engine
            .define_label("start")
            .show_line(Some("anna"), "Which way?")
            .present_menu(["North", "South"]);
        engine
    }

    #[test]
    fn snapshot_reflects_scene() {
        let engine = engine_with_menu();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.speaker.as_deref(), Some("anna"));
        assert_eq!(snapshot.dialogue.as_deref(), Some("Which way?"));
        assert_eq!(snapshot.choices.len(), 2);
        assert_eq!(snapshot.choices[1].caption, "South");
    }

    #[test]
    fn select_choice_dismisses_menu() {
        let mut engine = engine_with_menu();
        let chosen = engine.select_choice(1).expect("valid index");
        assert_eq!(chosen, 1);
        assert_eq!(engine.last_choice(), Some(1));
        assert!(engine.choices().is_empty());
    }

    #[test]
    fn select_choice_out_of_range() {
        let mut engine = engine_with_menu();
        let error = engine.select_choice(2).expect_err("out of range");
        assert_eq!(error.to_string(), "Index 2 out of range (0-1)");
        let error = engine.select_choice(-1).expect_err("negative index");
        assert_eq!(error.to_string(), "Index -1 out of range (0-1)");
    }

    #[test]
    fn select_choice_without_menu() {
        let mut engine = ScriptedEngine::new("Test Story");
        let error = engine.select_choice(0).expect_err("no menu");
        assert!(matches!(error, EngineError::NoActiveChoice));
    }

    #[test]
    fn advance_clears_dialogue() {
        let mut engine = ScriptedEngine::new("Test Story");
        engine.show_line(Some("anna"), "Hello.");
        engine.advance_dialogue().expect("dismiss supported");
        assert!(engine.snapshot().dialogue.is_none());
    }

    #[test]
    fn advance_unsupported_when_dismiss_disabled() {
        let mut engine = ScriptedEngine::new("Test Story");
        engine.without_dismiss();
        let error = engine.advance_dialogue().expect_err("dismiss disabled");
        assert!(error.is_unsupported());
    }

    #[test]
    fn variables_round_trip() {
        let mut engine = ScriptedEngine::new("Test Story");
        engine
            .write_variable("chapter", json!(3))
            .expect("settable");
        assert_eq!(engine.read_variable("chapter"), Some(json!(3)));
        assert_eq!(engine.read_variable("missing"), None);
    }

    #[test]
    fn reserved_variables_rejected() {
        let mut engine = ScriptedEngine::new("Test Story");
        let error = engine
            .write_variable("_internal", json!(true))
            .expect_err("reserved");
        assert!(error.to_string().contains("reserved"));
    }

    #[test]
    fn jump_requires_known_label() {
        let mut engine = engine_with_menu();
        engine.jump_to_label("start").expect("label defined");
        assert_eq!(engine.snapshot().label.as_deref(), Some("start"));
        let error = engine.jump_to_label("finale").expect_err("unknown label");
        assert_eq!(error.to_string(), "Label 'finale' not found");
    }

    #[test]
    fn capture_writes_scene_dump() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("shot.txt");
        let mut engine = engine_with_menu();
        engine.capture_screenshot(&path).expect("capture supported");
        let contents = fs::read_to_string(&path).expect("scene file");
        assert!(contents.contains("anna: Which way?"));
        assert!(contents.contains("[0] North"));
    }
}
