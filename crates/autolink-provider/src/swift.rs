//! `ExpoModulesProvider.swift` rendering.

use crate::errors::GenerateError;
use crate::identifiers::{escape_string_literal, is_swift_identifier};
use crate::target::Target;
use autolink_manifest::{IosDetails, ModuleDescriptor};
use std::collections::BTreeSet;
use std::fmt::Write as _;

const HEADER: &str = "/**
 * Automatically generated by autolink.
 *
 * This class provides the Swift classes of the native modules linked into the app.
 */
";

/// Entries of one generated list, split by build configuration
#[derive(Default)]
struct Split {
    release: Vec<String>,
    debug: Vec<String>,
}

impl Split {
    fn push(&mut self, debug_only: bool, entry: String) {
        if debug_only {
            self.debug.push(entry);
        } else {
            self.release.push(entry);
        }
    }
}

pub(crate) fn render(modules: &[ModuleDescriptor]) -> (String, Vec<GenerateError>, usize) {
    let mut errors = Vec::new();
    let mut release_imports = BTreeSet::new();
    let mut debug_imports = BTreeSet::new();
    let mut classes = Split::default();
    let mut subscribers = Split::default();
    let mut handlers = Split::default();
    let mut count = 0;

    for module in modules {
        let Some(ios) = module.ios() else {
            continue;
        };
        if let Err(error) = validate(module, ios) {
            errors.push(error);
            continue;
        }
        count += 1;

        let contributes = !ios.modules.is_empty()
            || !ios.app_delegate_subscribers.is_empty()
            || !ios.react_delegate_handlers.is_empty();
        if contributes {
            if ios.debug_only {
                debug_imports.insert(ios.swift_module_name.as_str());
            } else {
                release_imports.insert(ios.swift_module_name.as_str());
            }
        }

        for class in &ios.modules {
            classes.push(ios.debug_only, format!("{}.self", class));
        }
        for subscriber in &ios.app_delegate_subscribers {
            subscribers.push(ios.debug_only, format!("{}.self", subscriber));
        }
        for handler in &ios.react_delegate_handlers {
            handlers.push(
                ios.debug_only,
                format!(
                    "(packageName: \"{}\", handler: {}.self)",
                    escape_string_literal(&module.package_name),
                    handler
                ),
            );
        }
    }

    let mut out = String::from(HEADER);
    out.push('\n');
    out.push_str("import ExpoModulesCore\n");
    for import in &release_imports {
        let _ = writeln!(out, "import {}", import);
    }
    let debug_only_imports: Vec<&&str> = debug_imports.difference(&release_imports).collect();
    if !debug_only_imports.is_empty() {
        out.push_str("#if DEBUG\n");
        for import in debug_only_imports {
            let _ = writeln!(out, "import {}", import);
        }
        out.push_str("#endif\n");
    }

    out.push_str("\n@objc(ExpoModulesProvider)\n");
    out.push_str("public class ExpoModulesProvider: ModulesProvider {\n");
    push_function(
        &mut out,
        "getModuleClasses() -> [AnyModule.Type]",
        &classes,
    );
    out.push('\n');
    push_function(
        &mut out,
        "getAppDelegateSubscribers() -> [ExpoAppDelegateSubscriber.Type]",
        &subscribers,
    );
    out.push('\n');
    push_function(
        &mut out,
        "getReactDelegateHandlers() -> [ExpoReactDelegateHandlerTupleType]",
        &handlers,
    );
    out.push_str("}\n");

    (out, errors, count)
}

fn validate(module: &ModuleDescriptor, ios: &IosDetails) -> Result<(), GenerateError> {
    let identifiers = std::iter::once(&ios.swift_module_name)
        .chain(&ios.modules)
        .chain(&ios.app_delegate_subscribers)
        .chain(&ios.react_delegate_handlers);
    for identifier in identifiers {
        if !is_swift_identifier(identifier) {
            return Err(GenerateError::InvalidIdentifier {
                module: module.name.clone(),
                identifier: identifier.clone(),
                target: Target::IosSwift,
            });
        }
    }
    Ok(())
}

fn push_function(out: &mut String, signature: &str, entries: &Split) {
    let _ = writeln!(out, "  public override func {} {{", signature);
    if entries.debug.is_empty() {
        push_return(out, entries.release.iter());
    } else {
        out.push_str("    #if DEBUG\n");
        push_return(out, entries.release.iter().chain(&entries.debug));
        out.push_str("    #else\n");
        push_return(out, entries.release.iter());
        out.push_str("    #endif\n");
    }
    out.push_str("  }\n");
}

fn push_return<'a>(out: &mut String, entries: impl Iterator<Item = &'a String>) {
    let entries: Vec<&String> = entries.collect();
    if entries.is_empty() {
        out.push_str("    return []\n");
        return;
    }
    out.push_str("    return [\n");
    let last = entries.len() - 1;
    for (i, entry) in entries.iter().enumerate() {
        let separator = if i == last { "" } else { "," };
        let _ = writeln!(out, "      {}{}", entry, separator);
    }
    out.push_str("    ]\n");
}
