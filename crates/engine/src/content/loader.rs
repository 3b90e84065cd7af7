use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use tracing::info;

use super::hashing::fingerprint_sources;
use super::tables::{
    AnswerDef, CollectibleDef, ContentTables, LevelDef, MinigameDef, ObjectiveDef, QuestionDef,
    RoleDef, SpeakerDef, SubtaskDef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadDir,
    ReadFile,
    NoContentFiles,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    MissingAttribute,
    InvalidValue,
    DuplicateId,
}

#[derive(Debug, Clone)]
pub struct ContentError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentError {}

/// One XML document. `name` is the path relative to the content directory.
#[derive(Debug, Clone)]
pub struct ContentSource {
    pub name: String,
    pub text: String,
}

/// Loads every `*.xml` under `dir`, in relative-path order.
pub fn load_content_dir(dir: &Path) -> Result<ContentTables, ContentError> {
    let mut files = Vec::<(String, PathBuf)>::new();
    collect_xml_files(dir, dir, &mut files)?;
    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    if files.is_empty() {
        return Err(ContentError {
            code: ContentErrorCode::NoContentFiles,
            message: "content directory contains no .xml files".to_string(),
            file_path: dir.to_path_buf(),
            location: None,
        });
    }

    let mut sources = Vec::with_capacity(files.len());
    for (name, path) in files {
        let text = fs::read_to_string(&path).map_err(|source| ContentError {
            code: ContentErrorCode::ReadFile,
            message: format!("failed to read XML file: {source}"),
            file_path: path.clone(),
            location: None,
        })?;
        sources.push(ContentSource { name, text });
    }

    let tables = parse_content_sources(&sources)?;
    info!(
        dir = %dir.display(),
        files = sources.len(),
        roles = tables.roles().len(),
        levels = tables.levels().len(),
        collectibles = tables.collectibles().len(),
        minigames = tables.minigames().len(),
        speakers = tables.speakers().len(),
        fingerprint = tables.fingerprint(),
        "content_loaded"
    );
    Ok(tables)
}

pub fn parse_content_sources(sources: &[ContentSource]) -> Result<ContentTables, ContentError> {
    let mut builder = TablesBuilder::default();
    for source in sources {
        let doc = Document::parse(&source.text).map_err(|error| ContentError {
            code: ContentErrorCode::XmlMalformed,
            message: format!("malformed XML: {error}"),
            file_path: PathBuf::from(&source.name),
            location: Some(SourceLocation {
                line: error.pos().row as usize,
                column: error.pos().col as usize,
            }),
        })?;
        let ctx = ParseCtx {
            file_path: Path::new(&source.name),
            doc: &doc,
        };
        builder.add_document(&ctx)?;
    }

    Ok(ContentTables::from_parts(
        builder.roles,
        builder.levels,
        builder.collectibles,
        builder.minigames,
        fingerprint_sources(sources),
    )
    .with_speakers(builder.speakers))
}

#[derive(Default)]
struct TablesBuilder {
    roles: Vec<RoleDef>,
    levels: Vec<LevelDef>,
    collectibles: Vec<CollectibleDef>,
    minigames: Vec<MinigameDef>,
    speakers: Vec<SpeakerDef>,
    seen: HashSet<(&'static str, String)>,
}

impl TablesBuilder {
    fn add_document(&mut self, ctx: &ParseCtx<'_, '_>) -> Result<(), ContentError> {
        let root = ctx.doc.root_element();
        if root.tag_name().name() != "Content" {
            return Err(ctx.error_at(
                root,
                ContentErrorCode::InvalidRoot,
                "root element must be <Content>".to_string(),
            ));
        }

        for child in root.children().filter(|node| node.is_element()) {
            match child.tag_name().name() {
                "Role" => {
                    ctx.expect_attributes(child, &["id", "label"])?;
                    let role = RoleDef {
                        id: ctx.required(child, "id")?,
                        label: ctx.required(child, "label")?,
                    };
                    self.claim(ctx, child, "Role", &role.id)?;
                    self.roles.push(role);
                }
                "Level" => {
                    let level = parse_level(ctx, child)?;
                    self.claim(ctx, child, "Level", &level.id)?;
                    self.levels.push(level);
                }
                "Collectible" => {
                    ctx.expect_attributes(child, &["id", "label", "correct"])?;
                    let item = CollectibleDef {
                        id: ctx.required(child, "id")?,
                        label: ctx.required(child, "label")?,
                        correct: ctx.optional_parsed(child, "correct")?.unwrap_or(true),
                    };
                    self.claim(ctx, child, "Collectible", &item.id)?;
                    self.collectibles.push(item);
                }
                "Minigame" => {
                    let minigame = parse_minigame(ctx, child)?;
                    self.claim(ctx, child, "Minigame", &minigame.id)?;
                    self.minigames.push(minigame);
                }
                "Speaker" => {
                    let speaker = parse_speaker(ctx, child)?;
                    self.claim(ctx, child, "Speaker", &speaker.id)?;
                    self.speakers.push(speaker);
                }
                other => {
                    return Err(ctx.error_at(
                        child,
                        ContentErrorCode::UnknownElement,
                        format!(
                            "unsupported element <{other}>; expected Role, Level, Collectible, Minigame or Speaker"
                        ),
                    ))
                }
            }
        }
        Ok(())
    }

    fn claim(
        &mut self,
        ctx: &ParseCtx<'_, '_>,
        node: Node<'_, '_>,
        table: &'static str,
        id: &str,
    ) -> Result<(), ContentError> {
        if self.seen.insert((table, id.to_string())) {
            return Ok(());
        }
        Err(ctx.error_at(
            node,
            ContentErrorCode::DuplicateId,
            format!("duplicate {table} id '{id}'"),
        ))
    }
}

fn parse_level(ctx: &ParseCtx<'_, '_>, node: Node<'_, '_>) -> Result<LevelDef, ContentError> {
    ctx.expect_attributes(node, &["id", "title"])?;
    let id = ctx.required(node, "id")?;
    let title = ctx.required(node, "title")?;
    let mut task_ids = HashSet::<String>::new();
    let mut objectives = Vec::new();

    for objective in node.children().filter(|child| child.is_element()) {
        if objective.tag_name().name() != "Objective" {
            return Err(ctx.error_at(
                objective,
                ContentErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}> in <Level>; expected <Objective>",
                    objective.tag_name().name()
                ),
            ));
        }
        ctx.expect_attributes(objective, &["id", "task", "hideSubtasks"])?;
        let objective_id = ctx.required(objective, "id")?;
        claim_task_id(ctx, objective, &id, &objective_id, &mut task_ids)?;

        let mut subtasks = Vec::new();
        for subtask in objective.children().filter(|child| child.is_element()) {
            if subtask.tag_name().name() != "Subtask" {
                return Err(ctx.error_at(
                    subtask,
                    ContentErrorCode::UnknownElement,
                    format!(
                        "unsupported element <{}> in <Objective>; expected <Subtask>",
                        subtask.tag_name().name()
                    ),
                ));
            }
            ctx.expect_attributes(subtask, &["id", "task"])?;
            let subtask_id = ctx.required(subtask, "id")?;
            claim_task_id(ctx, subtask, &id, &subtask_id, &mut task_ids)?;
            subtasks.push(SubtaskDef {
                id: subtask_id,
                task: ctx.required(subtask, "task")?,
            });
        }

        objectives.push(ObjectiveDef {
            id: objective_id,
            task: ctx.required(objective, "task")?,
            hide_subtasks: ctx.optional_parsed(objective, "hideSubtasks")?.unwrap_or(false),
            subtasks,
        });
    }

    Ok(LevelDef {
        id,
        title,
        objectives,
    })
}

fn claim_task_id(
    ctx: &ParseCtx<'_, '_>,
    node: Node<'_, '_>,
    level_id: &str,
    task_id: &str,
    seen: &mut HashSet<String>,
) -> Result<(), ContentError> {
    if seen.insert(task_id.to_string()) {
        return Ok(());
    }
    Err(ctx.error_at(
        node,
        ContentErrorCode::DuplicateId,
        format!("duplicate task id '{task_id}' in level '{level_id}'"),
    ))
}

fn parse_minigame(ctx: &ParseCtx<'_, '_>, node: Node<'_, '_>) -> Result<MinigameDef, ContentError> {
    ctx.expect_attributes(
        node,
        &["id", "title", "summary", "timeLimitSeconds", "failureDamage"],
    )?;
    let time_limit_seconds: f32 = ctx
        .optional_parsed(node, "timeLimitSeconds")?
        .unwrap_or(30.0);
    if !time_limit_seconds.is_finite() || time_limit_seconds <= 0.0 {
        return Err(ctx.error_at(
            node,
            ContentErrorCode::InvalidValue,
            "timeLimitSeconds must be finite and > 0".to_string(),
        ));
    }
    Ok(MinigameDef {
        id: ctx.required(node, "id")?,
        title: ctx.required(node, "title")?,
        summary: node.attribute("summary").unwrap_or_default().trim().to_string(),
        time_limit_seconds,
        failure_damage: ctx.optional_parsed(node, "failureDamage")?.unwrap_or(20),
    })
}

fn parse_speaker(ctx: &ParseCtx<'_, '_>, node: Node<'_, '_>) -> Result<SpeakerDef, ContentError> {
    ctx.expect_attributes(node, &["id", "lineSeconds"])?;
    let line_seconds: Option<f32> = ctx.optional_parsed(node, "lineSeconds")?;
    if line_seconds.is_some_and(|seconds| !seconds.is_finite() || seconds <= 0.0) {
        return Err(ctx.error_at(
            node,
            ContentErrorCode::InvalidValue,
            "lineSeconds must be finite and > 0".to_string(),
        ));
    }

    let mut lines = Vec::new();
    let mut question = None;
    for child in node.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "Line" => {
                ctx.expect_attributes(child, &["text"])?;
                lines.push(ctx.required(child, "text")?);
            }
            "Question" if question.is_none() => question = Some(parse_question(ctx, child)?),
            "Question" => {
                return Err(ctx.error_at(
                    child,
                    ContentErrorCode::InvalidValue,
                    "a <Speaker> may ask at most one <Question>".to_string(),
                ))
            }
            other => {
                return Err(ctx.error_at(
                    child,
                    ContentErrorCode::UnknownElement,
                    format!(
                        "unsupported element <{other}> in <Speaker>; expected <Line> or <Question>"
                    ),
                ))
            }
        }
    }
    if lines.is_empty() && question.is_none() {
        return Err(ctx.error_at(
            node,
            ContentErrorCode::InvalidValue,
            "a <Speaker> needs at least one <Line> or a <Question>".to_string(),
        ));
    }

    Ok(SpeakerDef {
        id: ctx.required(node, "id")?,
        lines,
        line_seconds,
        question,
    })
}

fn parse_question(ctx: &ParseCtx<'_, '_>, node: Node<'_, '_>) -> Result<QuestionDef, ContentError> {
    ctx.expect_attributes(node, &["text"])?;
    let mut answers = Vec::new();
    for answer in node.children().filter(|child| child.is_element()) {
        if answer.tag_name().name() != "Answer" {
            return Err(ctx.error_at(
                answer,
                ContentErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}> in <Question>; expected <Answer>",
                    answer.tag_name().name()
                ),
            ));
        }
        ctx.expect_attributes(answer, &["text", "score"])?;
        answers.push(AnswerDef {
            text: ctx.required(answer, "text")?,
            score: ctx.optional_parsed(answer, "score")?.unwrap_or(0),
        });
    }
    if answers.is_empty() {
        return Err(ctx.error_at(
            node,
            ContentErrorCode::InvalidValue,
            "a <Question> needs at least one <Answer>".to_string(),
        ));
    }
    Ok(QuestionDef {
        text: ctx.required(node, "text")?,
        answers,
    })
}

struct ParseCtx<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl ParseCtx<'_, '_> {
    fn expect_attributes(&self, node: Node<'_, '_>, allowed: &[&str]) -> Result<(), ContentError> {
        for attribute in node.attributes() {
            if !allowed.contains(&attribute.name()) {
                return Err(self.error_at(
                    node,
                    ContentErrorCode::UnknownAttribute,
                    format!(
                        "unknown attribute '{}' on <{}>",
                        attribute.name(),
                        node.tag_name().name()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn required(&self, node: Node<'_, '_>, name: &str) -> Result<String, ContentError> {
        let value = node.attribute(name).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(self.error_at(
                node,
                ContentErrorCode::MissingAttribute,
                format!(
                    "missing required attribute '{}' on <{}>",
                    name,
                    node.tag_name().name()
                ),
            ));
        }
        Ok(value.to_string())
    }

    fn optional_parsed<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>, ContentError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| {
            self.error_at(
                node,
                ContentErrorCode::InvalidValue,
                format!(
                    "attribute '{}' on <{}> has invalid value '{}'",
                    name,
                    node.tag_name().name(),
                    raw
                ),
            )
        })
    }

    fn error_at(
        &self,
        node: Node<'_, '_>,
        code: ContentErrorCode,
        message: String,
    ) -> ContentError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

fn collect_xml_files(
    root: &Path,
    current: &Path,
    files: &mut Vec<(String, PathBuf)>,
) -> Result<(), ContentError> {
    let read_dir_error = |source: std::io::Error| ContentError {
        code: ContentErrorCode::ReadDir,
        message: format!("failed to read directory: {source}"),
        file_path: current.to_path_buf(),
        location: None,
    };
    let entries = fs::read_dir(current).map_err(read_dir_error)?;
    for entry in entries {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_dir() {
            collect_xml_files(root, &path, files)?;
            continue;
        }
        let is_xml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if !is_xml {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let name = rel
            .components()
            .map(|component| component.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, path));
    }
    Ok(())
}
