//! The demo components.
//!
//! Each constructor builds its component explicitly; the binary creates the
//! one it needs for the selected subcommand.

use std::collections::BTreeMap;
use std::path::Path;

use helmet::prelude::*;
use serde::{Deserialize, Serialize};

/// Output shape of the basic and file-based components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub my: String,
    pub spec: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub replicas: u32,
    pub selector: Selector,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
}

/// Render input shared by all demo components.
#[derive(Debug, Clone)]
pub struct Input {
    pub number: i64,
}

#[derive(Debug, Clone, Serialize)]
struct App {
    name: &'static str,
    image: &'static str,
    port: u16,
}

const APPS: [App; 2] = [
    App {
        name: "kuard",
        image: "gcr.io/kuar-demo/kuard",
        port: 8080,
    },
    App {
        name: "certbot",
        image: "docker.io/certbot/certbot",
        port: 80,
    },
];

const BASIC_TEMPLATE: &str = r#"
    my: cool
    spec:
      - Hello
      - There
      - {{ Helmet.Number | quote }}
      - {{ Catify("I LOVE CATS") }}
"#;

fn catify(s: String) -> String {
    format!("🐈 {} 🐈", s)
}

fn spec_context(input: &Input) -> Result<Context, BoxError> {
    Ok(Context::new()
        .var("Number", input.number)
        .func("Catify", catify))
}

/// Inline template with a variable and a callable.
pub fn basic() -> Result<Component<Spec, Input>, Error> {
    Component::create(Def::new(
        "BasicComponent",
        TemplateSource::inline(BASIC_TEMPLATE),
        spec_context,
    ))
}

/// Same as [`basic`], with the template read from `templates/fromfile.yaml.j2`.
pub fn from_file(templates: &Path) -> Result<Component<Spec, Input>, Error> {
    Component::create(
        Def::new(
            "FileComponent",
            TemplateSource::file(templates.join("fromfile.yaml.j2")),
            spec_context,
        )
        .options(Options::default().frontload(Input { number: 1 })),
    )
}

/// One Deployment per demo app; the `release` label is left for Helm.
pub fn deployments(templates: &Path) -> Result<ComponentMulti<Deployment, Input>, Error> {
    ComponentMulti::create(DefMulti::new(
        "HelmComponent",
        TemplateSource::file(templates.join("deployments.yaml.j2")),
        |input: &Input| {
            Ok(Context::new()
                .var("Number", input.number)
                .var("Apps", APPS)
                .func("Image", |image: String, tag: i64| {
                    format!("{}-amd64:{}", image, tag)
                }))
        },
        InstanceSource::from_fn(|_: &Input, _: &Context| Ok(vec![Deployment::default(); APPS.len()])),
    ))
}
