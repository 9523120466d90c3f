use std::env;
use std::error::Error;
use std::fs;
use std::process;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use weft_xhtml::{
    action, AttrValue, Child, Component, ComponentId, MemoryCallbacks, RenderConfig, RenderError,
    RenderMode, RenderResult, Renderer, SessionIds, Submitted,
};

/// A user account edited by the admin page
#[derive(Debug, Default)]
struct Account {
    name: String,
    roles: Vec<String>,
    notes: String,
}

struct AccountEditor {
    id: ComponentId,
    account: Arc<Mutex<Account>>,
}

impl Component for AccountEditor {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn url(&self) -> Option<&str> {
        Some("account")
    }

    fn render(&self, h: &mut Renderer, _view: Option<&str>) -> RenderResult<Child> {
        h.head().css("editor", ".error-message { color: red; }");
        let account = self.account.lock().unwrap_or_else(|e| e.into_inner());

        let mut form = h.make_element("form");

        let mut name = h.element(
            "input",
            vec![
                ("type", "text".into()),
                ("value", AttrValue::from(account.name.as_str())),
            ],
            vec![],
        )?;
        let target = self.account.clone();
        h.action(
            &mut name,
            action(move |v| {
                if let (Submitted::Value(v), Ok(mut a)) = (v, target.lock()) {
                    a.name = v;
                }
                Ok(())
            }),
        )?;
        let error = account.name.is_empty().then_some("a name is required");
        let name = h.decorate_error(name, error);
        h.add_child(&mut form, name)?;

        let mut roles = h.element("select", vec![("multiple", "multiple".into())], vec![])?;
        for role in ["admin", "operator", "viewer"] {
            let mut option = h.element("option", vec![("value", role.into())], vec![role.into()])?;
            option.set_selected(account.roles.clone())?;
            h.add_child(&mut roles, option)?;
        }
        let target = self.account.clone();
        h.action(
            &mut roles,
            action(move |v| {
                if let (Submitted::Values(v), Ok(mut a)) = (v, target.lock()) {
                    a.roles = v;
                }
                Ok(())
            }),
        )?;
        h.add_child(&mut form, roles)?;

        let mut notes = h.element("textarea", vec![], vec![account.notes.as_str().into()])?;
        let target = self.account.clone();
        h.action(
            &mut notes,
            action(move |v| {
                if let (Submitted::Value(v), Ok(mut a)) = (v, target.lock()) {
                    a.notes = v;
                }
                Ok(())
            }),
        )?;
        h.add_child(&mut form, notes)?;

        let mut save = h.element(
            "input",
            vec![("type", "submit".into()), ("value", "Save".into())],
            vec![],
        )?;
        h.action(&mut save, action(|_| Ok(())))?;
        h.add_child(&mut form, save)?;

        Ok(form.into())
    }
}

fn run(mode: RenderMode, config: RenderConfig) -> Result<(), Box<dyn Error>> {
    let callbacks = Arc::new(MemoryCallbacks::new());
    let editor = AccountEditor {
        id: ComponentId::fresh(),
        account: Arc::new(Mutex::new(Account::default())),
    };

    let h = Renderer::builder(callbacks.clone())
        .config(config.clone())
        .session(Rc::new(SessionIds::new("demo", "1")))
        .build(mode);
    match mode {
        RenderMode::Sync => {
            let body = h.render(&editor, None)?;
            println!("{}", h.render_document(body));
        }
        RenderMode::Async => {
            let update = h.render_update(&editor, None, "editor")?;
            println!("{}", serde_json::to_string_pretty(&update)?);
        }
    }

    // Field actions run before the submit action, whatever the order of the parameters
    let handles = callbacks.handles_of(editor.id);
    let values = [
        Submitted::None,
        Submitted::from("line 1\r\nline 2"),
        Submitted::from("operator"),
        Submitted::from("Ada"),
    ];
    let params: Vec<(&str, Submitted)> = handles
        .iter()
        .rev()
        .map(|handle| handle.as_str())
        .zip(values)
        .collect();
    callbacks.process(&params)?;
    let account = editor.account.lock().unwrap_or_else(|e| e.into_inner());
    tracing::info!("account after submit: {:?}", account);
    drop(account);

    let h = Renderer::builder(callbacks)
        .config(config)
        .session(Rc::new(SessionIds::new("demo", "2")))
        .build(RenderMode::Sync);
    let body = h.render(&editor, None)?;
    println!("{}", h.render_document(body));
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let mode = match args.get(1).map(String::as_str) {
        None | Some("sync") => RenderMode::Sync,
        Some("async") => RenderMode::Async,
        Some(other) => {
            eprintln!("Usage: weft-demo [sync|async] [config.yaml]");
            eprintln!("  unknown mode '{}'", other);
            process::exit(1);
        }
    };

    let config = match args.get(2) {
        Some(path) => match fs::read_to_string(path)
            .map_err(|e| RenderError::IoError {
                path: path.clone(),
                message: e.to_string(),
            })
            .and_then(|yaml| RenderConfig::from_yaml(&yaml))
        {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ {}", e);
                process::exit(1);
            }
        },
        None => RenderConfig::default(),
    };

    if let Err(e) = run(mode, config) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}
