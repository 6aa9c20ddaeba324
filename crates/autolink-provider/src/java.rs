//! `ExpoModulesPackageList.java` rendering.

use crate::errors::GenerateError;
use crate::identifiers::is_java_qualified_name;
use crate::target::Target;
use autolink_manifest::ModuleDescriptor;
use std::fmt::Write as _;

const PREAMBLE: &str = "package expo.modules;

import expo.modules.core.interfaces.Package;
import expo.modules.kotlin.modules.Module;
import expo.modules.kotlin.ModulesProvider;

import java.util.Arrays;
import java.util.List;

public class ExpoModulesPackageList implements ModulesProvider {
  private static class LazyHolder {
";

const EPILOGUE: &str = "  }

  public static List<Package> getPackageList() {
    return LazyHolder.packagesList;
  }

  @Override
  public List<Class<? extends Module>> getModulesList() {
    return LazyHolder.modulesList;
  }
}
";

pub(crate) fn render(modules: &[ModuleDescriptor]) -> (String, Vec<GenerateError>, usize) {
    let mut errors = Vec::new();
    let mut packages = Vec::new();
    let mut classes = Vec::new();
    let mut count = 0;

    for module in modules {
        let Some(android) = module.android() else {
            continue;
        };
        let invalid = android
            .packages
            .iter()
            .chain(&android.modules)
            .find(|name| !is_java_qualified_name(name));
        if let Some(identifier) = invalid {
            errors.push(GenerateError::InvalidIdentifier {
                module: module.name.clone(),
                identifier: identifier.clone(),
                target: Target::AndroidJava,
            });
            continue;
        }
        count += 1;
        packages.extend(android.packages.iter().map(|name| format!("new {}()", name)));
        classes.extend(android.modules.iter().map(|name| format!("{}.class", name)));
    }

    let mut out = String::from(PREAMBLE);
    push_list(&mut out, "Package", "packagesList", &packages);
    out.push('\n');
    push_list(&mut out, "Class<? extends Module>", "modulesList", &classes);
    out.push_str(EPILOGUE);

    (out, errors, count)
}

fn push_list(out: &mut String, element: &str, field: &str, entries: &[String]) {
    let _ = write!(
        out,
        "    static final List<{element}> {field} = Arrays.<{element}>asList("
    );
    if entries.is_empty() {
        out.push_str(");\n");
        return;
    }
    out.push('\n');
    let last = entries.len() - 1;
    for (i, entry) in entries.iter().enumerate() {
        let separator = if i == last { "" } else { "," };
        let _ = writeln!(out, "      {}{}", entry, separator);
    }
    out.push_str("    );\n");
}
