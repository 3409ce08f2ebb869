use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::template::PromptTemplate;

/// Global variable holding the caller's question.
pub const QUERY_VAR: &str = "query";
/// Global variable holding the extracted (truncated) document text.
pub const DOCUMENT_TEXT_VAR: &str = "document_text";

/// One prompt-driven step of a pipeline.
///
/// `role`, `goal` and `backstory` describe the persona presented to the
/// model; they do not influence ordering or context propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    pub prompt: String,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Stage {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: String::new(),
            goal: String::new(),
            backstory: String::new(),
            prompt: prompt.into(),
            expected_output: None,
            depends_on: Vec::new(),
        }
    }

    pub fn with_persona(
        mut self,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        self.role = role.into();
        self.goal = goal.into();
        self.backstory = backstory.into();
        self
    }

    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }
}

fn default_inputs() -> Vec<String> {
    vec![QUERY_VAR.to_string(), DOCUMENT_TEXT_VAR.to_string()]
}

/// Ordered stage list plus the names of the global variables every run binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_inputs")]
    pub inputs: Vec<String>,
    pub stages: Vec<Stage>,
}

impl PipelineConfig {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            inputs: default_inputs(),
            stages,
        }
    }

    /// Checks the definition without building a pipeline.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.compile().map(|_| ())
    }

    pub(crate) fn compile(&self) -> Result<Vec<CompiledStage>, PipelineError> {
        if self.stages.is_empty() {
            return Err(PipelineError::InvalidDefinition(
                "pipeline has no stages".to_string(),
            ));
        }

        let inputs: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        let mut compiled: Vec<CompiledStage> = Vec::with_capacity(self.stages.len());

        for (position, stage) in self.stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                return Err(PipelineError::InvalidDefinition(format!(
                    "stage #{} has an empty name",
                    position + 1
                )));
            }
            if inputs.contains(stage.name.as_str()) {
                return Err(PipelineError::InvalidDefinition(format!(
                    "stage '{}' shadows a global input of the same name",
                    stage.name
                )));
            }
            if compiled.iter().any(|c| c.stage.name == stage.name) {
                return Err(PipelineError::InvalidDefinition(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }

            let mut dependencies = Vec::with_capacity(stage.depends_on.len());
            for dep in &stage.depends_on {
                if dep == &stage.name {
                    return Err(PipelineError::InvalidDefinition(format!(
                        "stage '{}' depends on itself",
                        stage.name
                    )));
                }
                // Only earlier stages are visible, which also rules out cycles.
                let index = compiled
                    .iter()
                    .position(|c| &c.stage.name == dep)
                    .ok_or_else(|| {
                        PipelineError::InvalidDefinition(format!(
                            "stage '{}' depends on '{}', which is not an earlier stage",
                            stage.name, dep
                        ))
                    })?;
                if dependencies.contains(&index) {
                    return Err(PipelineError::InvalidDefinition(format!(
                        "stage '{}' lists dependency '{}' more than once",
                        stage.name, dep
                    )));
                }
                dependencies.push(index);
            }

            let template = PromptTemplate::parse(&stage.prompt);
            for name in template.placeholders() {
                let bound = inputs.contains(name.as_str())
                    || stage.depends_on.iter().any(|d| d == name);
                if !bound {
                    return Err(PipelineError::MissingVariable {
                        stage: stage.name.clone(),
                        name: name.clone(),
                    });
                }
            }

            let goal = PromptTemplate::parse(&stage.goal);
            if let Some(name) = goal
                .placeholders()
                .iter()
                .find(|name| !inputs.contains(name.as_str()))
            {
                return Err(PipelineError::MissingVariable {
                    stage: stage.name.clone(),
                    name: name.clone(),
                });
            }

            compiled.push(CompiledStage {
                stage: stage.clone(),
                template,
                goal,
                dependencies,
            });
        }

        Ok(compiled)
    }
}

/// A validated stage with parsed templates and resolved dependency indices.
#[derive(Debug, Clone)]
pub(crate) struct CompiledStage {
    pub stage: Stage,
    pub template: PromptTemplate,
    pub goal: PromptTemplate,
    /// Indices into the stage list, in declared dependency order.
    pub dependencies: Vec<usize>,
}
