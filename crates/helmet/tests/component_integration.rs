use std::collections::BTreeMap;
use std::fs;

use helmet::prelude::*;
use helmet::DecodeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deployment {
    api_version: String,
    kind: String,
    metadata: Metadata,
    #[serde(default)]
    spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Metadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DeploymentSpec {
    #[serde(default)]
    replicas: Option<u32>,
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    name: String,
    image: String,
    #[serde(default)]
    ports: Vec<Port>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Port {
    container_port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct DaemonSetSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Clone)]
struct Input {
    name: String,
    replicas: u32,
}

fn input() -> Input {
    Input {
        name: "kuard".into(),
        replicas: 2,
    }
}

fn setup(input: &Input) -> Result<Context, BoxError> {
    Ok(Context::new()
        .var("Name", &input.name)
        .var("Replicas", input.replicas)
        .func("Image", |name: String| format!("gcr.io/kuar-demo/{}-amd64:1", name)))
}

const DEPLOYMENT: &str = r#"
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: {{ Helmet.Name }}
    spec:
      replicas: {{ Helmet.Replicas }}
      containers:
        - name: {{ Helmet.Name }}
          image: {{ Image(Helmet.Name) | quote }}
          ports:
            - containerPort: 8080
"#;

const TWO_DEPLOYMENTS: &str = r#"
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: {{ Helmet.Name }}
    ---
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: certbot
"#;

#[test]
fn test_single_component_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployment.yaml.j2");
    fs::write(&path, DEPLOYMENT).unwrap();

    let component: Component<Deployment, Input> = Component::create(Def::new(
        "Deployment",
        TemplateSource::file(&path),
        setup,
    ))
    .unwrap();

    let (deployment, text) = component.render(&input()).unwrap();
    assert_eq!(deployment.kind, "Deployment");
    assert_eq!(deployment.metadata.name, "kuard");
    assert_eq!(deployment.spec.replicas, Some(2));
    assert_eq!(
        deployment.spec.containers[0].image,
        "gcr.io/kuar-demo/kuard-amd64:1"
    );
    assert_eq!(deployment.spec.containers[0].ports[0].container_port, 8080);
    assert!(text.starts_with("apiVersion: apps/v1\n"));
}

#[test]
fn test_template_file_is_read_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deployment.yaml.j2");
    fs::write(&path, DEPLOYMENT).unwrap();

    let component: Component<Deployment, Input> =
        Component::create(Def::new("Deployment", TemplateSource::file(&path), setup)).unwrap();
    fs::remove_file(&path).unwrap();

    assert!(component.render(&input()).is_ok());
}

#[test]
fn test_missing_template_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Component::<Deployment, Input>::create(Def::new(
        "Deployment",
        TemplateSource::file(dir.path().join("missing.yaml")),
        setup,
    ))
    .unwrap_err();

    assert!(matches!(err, Error::FileRead { .. }));
    assert_eq!(err.stage(), Stage::Load);
    assert_eq!(err.component(), "Deployment");
}

#[test]
fn test_multi_component_with_blueprints() {
    let mut labelled = Deployment::default();
    labelled
        .metadata
        .labels
        .insert("team".into(), "platform".into());

    let component = ComponentMulti::create(DefMulti::new(
        "Deployments",
        TemplateSource::inline(TWO_DEPLOYMENTS),
        setup,
        InstanceSource::Static(vec![labelled.clone(), Deployment::default()]),
    ))
    .unwrap();

    let (deployments, documents) = component.render(&input()).unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(deployments[0].metadata.name, "kuard");
    assert_eq!(deployments[1].metadata.name, "certbot");

    // The blueprint's label survives; the sibling blueprint is untouched.
    assert_eq!(deployments[0].metadata.labels["team"], "platform");
    assert!(deployments[1].metadata.labels.is_empty());

    let (again, _) = component.render(&input()).unwrap();
    assert_eq!(again, deployments);
}

#[test]
fn test_count_mismatch() {
    let component = ComponentMulti::create(DefMulti::new(
        "Deployments",
        TemplateSource::inline(TWO_DEPLOYMENTS),
        setup,
        InstanceSource::Static(vec![Deployment::default()]),
    ))
    .unwrap();

    let err = component.render(&input()).unwrap_err();
    match &err {
        Error::CountMismatch {
            expected, found, ..
        } => {
            assert_eq!(*expected, 1);
            assert_eq!(*found, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stage(), Stage::Instances);
}

#[test]
fn test_count_mismatch_is_checked_before_decoding() {
    let component = ComponentMulti::create(
        DefMulti::new(
            "Deployments",
            TemplateSource::inline("a: 1\n---\nb: 2"),
            |_: &()| Ok(Context::new()),
            InstanceSource::Static(vec![Deployment::default()]),
        )
        .render_with(|_, _, _| panic!("must not run")),
    )
    .unwrap();

    assert!(matches!(
        component.render(&()).unwrap_err(),
        Error::CountMismatch { .. }
    ));
}

#[test]
fn test_instances_from_input() {
    let component = ComponentMulti::create(DefMulti::new(
        "Numbers",
        TemplateSource::inline(
            "{% for n in range(Helmet.Count) %}{% if not loop.first %}---\n{% endif %}name: n{{ n }}\n{% endfor %}",
        ),
        |count: &usize| Ok(Context::new().var("Count", *count)),
        InstanceSource::from_fn(|count: &usize, _: &Context| Ok(vec![Metadata::default(); *count])),
    ))
    .unwrap();

    let (items, _) = component.render(&3).unwrap();
    let names: Vec<_> = items.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["n0", "n1", "n2"]);
}

#[test]
fn test_per_document_accepts_any_count() {
    let component: ComponentMulti<Metadata, ()> = ComponentMulti::create(DefMulti::new(
        "Any",
        TemplateSource::inline("name: a\n---\nname: b\n---\nname: c"),
        |_: &()| Ok(Context::new()),
        InstanceSource::PerDocument,
    ))
    .unwrap();

    let (items, documents) = component.render(&()).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(documents[2], "name: c");
}

#[test]
fn test_custom_separator() {
    let component: ComponentMulti<Metadata, ()> = ComponentMulti::create(
        DefMulti::new(
            "Any",
            TemplateSource::inline("name: a\n%%\nname: b"),
            |_: &()| Ok(Context::new()),
            InstanceSource::PerDocument,
        )
        .options(Options::default().separator("%%")),
    )
    .unwrap();

    assert_eq!(component.render(&()).unwrap().0.len(), 2);
}

#[test]
fn test_unknown_field_is_validation_error() {
    let component: Component<DaemonSetSpec, ()> = Component::create(Def::new(
        "DaemonSet",
        TemplateSource::inline("replicas: 2\ncontainers: []"),
        |_: &()| Ok(Context::new()),
    ))
    .unwrap();

    let err = component.render(&()).unwrap_err();
    assert!(err.to_string().contains("\"replicas\""));
    assert_eq!(err.stage(), Stage::Decode);
    match err {
        Error::Validation {
            document,
            source: DecodeError::UnknownFields { fields },
            ..
        } => {
            assert_eq!(document, None);
            assert_eq!(fields, vec!["replicas"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_multi_validation_error_names_document() {
    let component = ComponentMulti::create(DefMulti::new(
        "Specs",
        TemplateSource::inline("containers: []\n---\nreplicas: 1"),
        |_: &()| Ok(Context::new()),
        InstanceSource::Static(vec![DaemonSetSpec::default(), DaemonSetSpec::default()]),
    ))
    .unwrap();

    match component.render(&()).unwrap_err() {
        Error::Validation { document, .. } => assert_eq!(document, Some(1)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_custom_render_override() {
    let component = Component::create(
        Def::new("Deployment", TemplateSource::inline(DEPLOYMENT), setup).render_with(
            |input: &Input, _: &Context, content: &str| {
                Ok(format!("{} rendered {} bytes", input.name, content.len()))
            },
        ),
    )
    .unwrap();

    let (summary, text) = component.render(&input()).unwrap();
    assert!(text.contains("name: kuard"));
    assert_eq!(summary, format!("kuard rendered {} bytes", text.len()));
}

#[test]
fn test_custom_multi_render_override() {
    let component = ComponentMulti::create(
        DefMulti::new(
            "Deployments",
            TemplateSource::inline(TWO_DEPLOYMENTS),
            setup,
            InstanceSource::Static(vec![String::new(), String::new()]),
        )
        .render_with(|_, _, parts: &[String]| {
            Ok(parts.iter().map(|p| p.lines().count().to_string()).collect())
        }),
    )
    .unwrap();

    let (counts, parts) = component.render(&input()).unwrap();
    assert_eq!(counts, vec!["4", "4"]);
    assert_eq!(parts.len(), 2);
}

#[test]
fn test_custom_render_failure() {
    let component: Component<String, ()> = Component::create(
        Def::new("c", TemplateSource::inline("x"), |_: &()| Ok(Context::new()))
            .render_with(|_, _, _| Err("bad document".into())),
    )
    .unwrap();

    let err = component.render(&()).unwrap_err();
    assert!(matches!(err, Error::CustomRender { .. }));
    assert!(err.to_string().contains("bad document"));
}

#[test]
fn test_frontload_surfaces_validation_error_at_creation() {
    let def = || {
        Def::new(
            "DaemonSet",
            TemplateSource::inline("replicas: {{ Helmet.Replicas }}"),
            |input: &Input| Ok(Context::new().var("Replicas", input.replicas)),
        )
    };

    let lazy: Component<DaemonSetSpec, Input> = Component::create(def()).unwrap();
    let direct = lazy.render(&input()).unwrap_err();

    let err = Component::<DaemonSetSpec, Input>::create(
        def().options(Options::default().frontload(input())),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(err.to_string(), direct.to_string());
}

#[test]
fn test_frontload_success() {
    let component: Component<Deployment, Input> = Component::create(
        Def::new("Deployment", TemplateSource::inline(DEPLOYMENT), setup)
            .options(Options::default().frontload(input())),
    )
    .unwrap();
    assert!(component.options().frontload_enabled());
}

#[test]
#[should_panic(expected = "validation error")]
fn test_panic_on_error_at_render() {
    let component: Component<DaemonSetSpec, ()> = Component::create(
        Def::new("DaemonSet", TemplateSource::inline("replicas: 2"), |_: &()| {
            Ok(Context::new())
        })
        .options(Options::default().panic_on_error(true)),
    )
    .unwrap();

    let _ = component.render(&());
}

#[test]
#[should_panic(expected = "error reading template file")]
fn test_panic_on_error_at_creation() {
    let _ = Component::<Deployment, Input>::create(
        Def::new("Deployment", TemplateSource::file("/nonexistent/helmet.yaml"), setup)
            .options(Options::default().panic_on_error(true)),
    );
}

#[test]
fn test_panicking_callable_is_caught() {
    let component: Component<Metadata, ()> = Component::create(Def::new(
        "Boom",
        TemplateSource::inline("name: {{ Explode('x') }}"),
        |_: &()| Ok(Context::new().func("Explode", |_: String| -> String { panic!("boom") })),
    ))
    .unwrap();

    match component.render(&()).unwrap_err() {
        Error::Panicked { component, message } => {
            assert_eq!(component, "Boom");
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_setup_error() {
    let component: Component<Metadata, Input> = Component::create(Def::new(
        "Strict",
        TemplateSource::inline("name: x"),
        |input: &Input| {
            if input.replicas == 0 {
                return Err("replicas must be positive".into());
            }
            Ok(Context::new())
        },
    ))
    .unwrap();

    let err = component
        .render(&Input {
            name: "x".into(),
            replicas: 0,
        })
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Setup);
    assert!(err.to_string().contains("replicas must be positive"));
}

#[test]
fn test_duplicate_binding_is_context_error() {
    let component: Component<Metadata, ()> = Component::create(Def::new(
        "Dup",
        TemplateSource::inline("name: {{ Helmet.Name }}"),
        |_: &()| Ok(Context::new().var("Name", "a").var("Name", "b")),
    ))
    .unwrap();

    let err = component.render(&()).unwrap_err();
    assert!(matches!(
        err,
        Error::ContextIntrospection {
            source: ContextError::DuplicateBinding(_),
            ..
        }
    ));
}

#[test]
fn test_parse_and_execution_errors() {
    let broken: Component<Metadata, ()> = Component::create(Def::without_setup(
        "Broken",
        TemplateSource::inline("name: {{ unclosed"),
    ))
    .unwrap();
    assert_eq!(broken.render(&()).unwrap_err().stage(), Stage::Parse);

    let strict: Component<Metadata, ()> = Component::create(
        Def::without_setup("Strict", TemplateSource::inline("name: {{ Helmet.Missing }}"))
            .options(Options::default().missing_key(MissingKey::Error)),
    )
    .unwrap();
    assert_eq!(strict.render(&()).unwrap_err().stage(), Stage::Execute);
}

#[test]
fn test_missing_value_is_scrubbed() {
    let component: Component<Metadata, ()> = Component::create(Def::without_setup(
        "Scrub",
        TemplateSource::inline("name: \"x{{ Helmet.Missing }}\""),
    ))
    .unwrap();

    let (metadata, text) = component.render(&()).unwrap();
    assert_eq!(metadata.name, "x");
    assert!(!text.contains("<no value>"));
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Item {
    #[serde(default)]
    name: String,
}

#[test]
fn test_empty_document_decodes_to_default() {
    let component: Component<Item, ()> = Component::create(Def::without_setup(
        "empty",
        TemplateSource::inline("{% if false %}name: a{% endif %}"),
    ))
    .unwrap();

    let (item, text) = component.render(&()).unwrap();
    assert_eq!(item, Item::default());
    assert!(text.trim().is_empty());
}

#[test]
fn test_per_document_empty_document_decodes_to_default() {
    let component: ComponentMulti<Item, ()> = ComponentMulti::create(DefMulti::new(
        "Sparse",
        TemplateSource::inline("name: a\n---\n{% if false %}name: b{% endif %}"),
        |_: &()| Ok(Context::new()),
        InstanceSource::PerDocument,
    ))
    .unwrap();

    let (items, _) = component.render(&()).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "a");
    assert_eq!(items[1], Item::default());
}

#[test]
fn test_tab_size_option() {
    let component: Component<Metadata, ()> = Component::create(
        Def::without_setup(
            "Tabs",
            TemplateSource::inline("\tname: x\n\tlabels:\n\t\tteam: a"),
        )
        .options(Options::default().tab_size(2)),
    )
    .unwrap();

    let (metadata, _) = component.render(&()).unwrap();
    assert_eq!(metadata.labels["team"], "a");
}

struct Catalog {
    entries: Vec<String>,
}

impl ToContext for Catalog {
    fn to_context(&self) -> Result<Context, ContextError> {
        Ok(Context::new()
            .var("Entries", &self.entries)
            .func("Upper", |s: String| s.to_uppercase()))
    }
}

#[test]
fn test_user_context_type() {
    let component: Component<Vec<String>, Vec<&'static str>, Catalog> =
        Component::create(Def::new(
            "Catalog",
            TemplateSource::inline(
                r#"
                {% for e in Helmet.Entries %}
                - {{ e | Upper }}
                {% endfor %}
                "#,
            ),
            |names: &Vec<&'static str>| {
                Ok(Catalog {
                    entries: names.iter().map(|s| s.to_string()).collect(),
                })
            },
        ))
        .unwrap();

    let (entries, _) = component.render(&vec!["a", "b"]).unwrap();
    assert_eq!(entries, vec!["A", "B"]);
}

#[test]
fn test_components_render_concurrently() {
    let component: Component<Deployment, Input> =
        Component::create(Def::new("Deployment", TemplateSource::inline(DEPLOYMENT), setup))
            .unwrap();
    let expected = component.render(&input()).unwrap().1;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| component.render(&input()).unwrap().1))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
