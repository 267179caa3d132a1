//! Input discovery: expands directory arguments into the units they hold
//! and decides where each unit's output goes.

use std::path::{Path, PathBuf};

/// Extension of the files picked up when a directory is given.
pub const SOURCE_EXTENSION: &str = "js";

/// One compilation unit on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Path as given or found, used in diagnostics.
    pub path: PathBuf,
    /// Path below the output directory. A file argument contributes its file
    /// name; a directory argument contributes paths relative to itself.
    pub relative: PathBuf,
}

/// Expand `args` into inputs, keeping argument order. Directories are walked
/// recursively; their files come out sorted.
pub fn collect_inputs(args: &[PathBuf]) -> Result<Vec<Input>, String> {
    let mut inputs = Vec::new();
    for arg in args {
        if arg.is_dir() {
            for relative in discover_sources(arg)? {
                inputs.push(Input {
                    path: arg.join(&relative),
                    relative,
                });
            }
        } else if arg.exists() {
            let relative = arg
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| format!("'{}' is not a file", arg.display()))?;
            inputs.push(Input {
                path: arg.clone(),
                relative,
            });
        } else {
            return Err(format!("'{}' does not exist", arg.display()));
        }
    }
    Ok(inputs)
}

/// Every source file below `root`, relative to it and sorted. Hidden entries
/// are skipped.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    walk(root, root, &mut files)
        .map_err(|e| format!("Failed to walk directory '{}': {}", root.display(), e))?;
    files.sort();
    Ok(files)
}

fn walk(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            walk(root, &path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION) {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.push(relative);
        }
    }
    Ok(())
}

/// Where the lowered code for `input` is written under `out_dir`.
pub fn output_path(out_dir: &Path, input: &Input) -> PathBuf {
    out_dir.join(&input.relative).with_extension(SOURCE_EXTENSION)
}

/// The span map written next to `output`: `a.js` maps to `a.js.map.json`.
pub fn map_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".map.json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn directories_expand_sorted_and_skip_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("b.js"), "").unwrap();
        fs::write(root.join("a.js"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(root.join("lib/util.js"), "").unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join(".cache/x.js"), "").unwrap();

        let files = discover_sources(root).unwrap();
        let names: Vec<&str> = files.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, ["a.js", "b.js", "lib/util.js"]);
    }

    #[test]
    fn file_arguments_keep_their_name() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("main.tb");
        fs::write(&file, "").unwrap();

        let inputs = collect_inputs(&[file.clone()]).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].path, file);
        assert_eq!(inputs[0].relative, PathBuf::from("main.tb"));
        assert_eq!(
            output_path(Path::new("out"), &inputs[0]),
            PathBuf::from("out/main.js")
        );
    }

    #[test]
    fn missing_inputs_are_errors() {
        let err = collect_inputs(&[PathBuf::from("definitely/not/here.js")]).unwrap_err();
        assert!(err.contains("does not exist"), "{err}");
    }

    #[test]
    fn map_files_sit_next_to_the_output() {
        assert_eq!(
            map_path(Path::new("out/lib/util.js")),
            PathBuf::from("out/lib/util.js.map.json")
        );
    }
}
