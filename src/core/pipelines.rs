//! Listing of the Data Pipelines that belong to this project.

use std::collections::BTreeMap;

use glob_match::glob_match;
use serde::{Deserialize, Serialize};

use crate::command::{self, CommandRunner, Invocation};
use crate::defaults::{Defaults, ResourceTag};
use crate::environment::AWS_PROFILE_VAR;
use crate::error::{Error, Result};

const MISSING: &str = "---";
const HEALTH_STATUS_FIELD: &str = "@healthStatus";
const STATE_FIELD: &str = "@pipelineState";
const TAGS_FIELD: &str = "*tags";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPipelinesResponse {
    #[serde(default)]
    pipeline_id_list: Vec<PipelineIdName>,
}

#[derive(Debug, Deserialize)]
struct PipelineIdName {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribePipelinesResponse {
    #[serde(default)]
    pipeline_description_list: Vec<PipelineDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineDescription {
    pipeline_id: String,
    name: String,
    #[serde(default)]
    fields: Vec<PipelineField>,
    #[serde(default)]
    tags: Vec<ResourceTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineField {
    key: String,
    #[serde(default)]
    string_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DataPipeline {
    pub pipeline_id: String,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

impl DataPipeline {
    fn from_description(description: PipelineDescription) -> Self {
        let fields = description
            .fields
            .into_iter()
            .filter(|field| field.key != TAGS_FIELD)
            .filter_map(|field| field.string_value.map(|value| (field.key, value)))
            .collect();

        Self {
            pipeline_id: description.pipeline_id,
            name: description.name,
            fields,
        }
    }

    pub fn health_status(&self) -> &str {
        self.fields.get(HEALTH_STATUS_FIELD).map(String::as_str).unwrap_or(MISSING)
    }

    pub fn state(&self) -> &str {
        self.fields.get(STATE_FIELD).map(String::as_str).unwrap_or(MISSING)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub pipeline_id: String,
    pub name: String,
    pub health_status: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineListing {
    pub selection: Vec<String>,
    pub pipelines: Vec<PipelineSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Pipeline ids matching any of the glob patterns; all ids when the
/// selection is empty.
pub fn select_ids(all_ids: Vec<String>, selection: &[String]) -> Vec<String> {
    if selection.is_empty() {
        return all_ids;
    }

    all_ids
        .into_iter()
        .filter(|id| selection.iter().any(|pattern| glob_match(pattern, id)))
        .collect()
}

/// Pipelines tagged for this project, sorted by name.
pub fn list(
    selection: &[String],
    profile: Option<&str>,
    defaults: &Defaults,
    runner: &dyn CommandRunner,
) -> Result<Vec<DataPipeline>> {
    let aws = |args: &[&str]| {
        let inv = Invocation::new(defaults.tools.aws.as_str())
            .args(["datapipeline"])
            .args(args.iter().copied());
        match profile {
            Some(profile) => inv.env(AWS_PROFILE_VAR, profile),
            None => inv,
        }
    };

    let listed: ListPipelinesResponse = parse_json(
        &command::run_checked(runner, &aws(&["list-pipelines"]))?,
        "list-pipelines",
    )?;
    let ids = select_ids(
        listed.pipeline_id_list.into_iter().map(|p| p.id).collect(),
        selection,
    );

    let project_tag = &defaults.pipelines.project_tag;
    let chunk_size = defaults.pipelines.describe_chunk_size.max(1);
    let mut pipelines = Vec::new();

    for chunk in ids.chunks(chunk_size) {
        let mut args = vec!["describe-pipelines", "--pipeline-ids"];
        args.extend(chunk.iter().map(String::as_str));
        let described: DescribePipelinesResponse =
            parse_json(&command::run_checked(runner, &aws(args.as_slice()))?, "describe-pipelines")?;

        pipelines.extend(
            described
                .pipeline_description_list
                .into_iter()
                .filter(|description| description.tags.contains(project_tag))
                .map(DataPipeline::from_description),
        );
    }

    pipelines.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pipelines)
}

/// Overview of the selected pipelines. A selection matching exactly one
/// pipeline also reports its fields.
pub fn show(
    selection: &[String],
    profile: Option<&str>,
    defaults: &Defaults,
    runner: &dyn CommandRunner,
) -> Result<PipelineListing> {
    let pipelines = list(selection, profile, defaults, runner)?;

    let mut warnings = Vec::new();
    if pipelines.is_empty() {
        warnings.push("Found no pipelines".to_string());
    } else if !selection.is_empty() && pipelines.len() > 1 {
        warnings.push("Selection matches more than one pipeline".to_string());
    }
    for warning in &warnings {
        log_status!("pipelines", "{}", warning);
    }

    let with_fields = !selection.is_empty() && pipelines.len() == 1;
    let pipelines = pipelines
        .into_iter()
        .map(|pipeline| PipelineSummary {
            health_status: pipeline.health_status().to_string(),
            state: pipeline.state().to_string(),
            fields: with_fields.then(|| pipeline.fields.clone()),
            pipeline_id: pipeline.pipeline_id,
            name: pipeline.name,
        })
        .collect();

    Ok(PipelineListing {
        selection: selection.to_vec(),
        pipelines,
        warnings,
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, context: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        Error::validation_invalid_json(
            e,
            Some(format!("parse {} response", context)),
            Some(raw.chars().take(200).collect::<String>()),
        )
    })
}
