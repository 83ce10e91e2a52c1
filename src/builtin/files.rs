use super::{BuiltinCommand, missing_operand};
use crate::command::{Context, Segment};
use anyhow::{Context as _, Result, anyhow};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// `src dst` operands; `dst` naming a directory means "into that directory".
fn source_and_destination(
    name: &str,
    segment: &Segment,
    ctx: &Context<'_>,
) -> Result<(PathBuf, PathBuf)> {
    let (src, dst) = match segment.params.as_slice() {
        [] => return Err(missing_operand(name)),
        [src] => return Err(anyhow!("{name}: missing destination file operand after '{src}'")),
        [src, dst] => (src, dst),
        _ => return Err(anyhow!("{name}: too many operands")),
    };
    let src_path = ctx.env.resolve(src);
    let mut dst_path = ctx.env.resolve(dst);
    if dst_path.is_dir() {
        let file_name = src_path
            .file_name()
            .ok_or_else(|| anyhow!("{name}: invalid source '{src}'"))?;
        dst_path.push(file_name);
    }
    Ok((src_path, dst_path))
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy a file. Directories are copied only with `r`.
pub struct Cp;

impl BuiltinCommand for Cp {
    const NAME: &'static str = "cp";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let (src, dst) = source_and_destination(Self::NAME, segment, ctx)?;
        let meta = fs::metadata(&src)
            .with_context(|| format!("cp: cannot stat '{}'", segment.params[0]))?;
        if meta.is_dir() {
            if !segment.has_flag('r') {
                return Err(anyhow!(
                    "cp: -r not specified; omitting directory '{}'",
                    segment.params[0]
                ));
            }
            if dst.starts_with(&src) {
                return Err(anyhow!(
                    "cp: cannot copy a directory, '{}', into itself",
                    segment.params[0]
                ));
            }
            copy_tree(&src, &dst)
                .with_context(|| format!("cp: cannot copy '{}'", segment.params[0]))?;
        } else {
            fs::copy(&src, &dst)
                .with_context(|| format!("cp: cannot copy '{}'", segment.params[0]))?;
        }
        Ok(None)
    }
}

/// Move or rename a file or directory.
pub struct Mv;

impl BuiltinCommand for Mv {
    const NAME: &'static str = "mv";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let (src, dst) = source_and_destination(Self::NAME, segment, ctx)?;
        fs::rename(&src, &dst)
            .with_context(|| format!("mv: cannot move '{}'", segment.params[0]))?;
        Ok(None)
    }
}

/// Remove files. Directories need `r`; `f` ignores missing operands.
pub struct Rm;

impl BuiltinCommand for Rm {
    const NAME: &'static str = "rm";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        if segment.params.is_empty() {
            if segment.has_flag('f') {
                return Ok(None);
            }
            return Err(missing_operand(Self::NAME));
        }
        for target in &segment.params {
            let path = ctx.env.resolve(target);
            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && segment.has_flag('f') => {
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("rm: cannot remove '{target}'"));
                }
            };
            let removed = if meta.is_dir() {
                if !segment.has_flag('r') {
                    return Err(anyhow!("rm: cannot remove '{target}': Is a directory"));
                }
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("rm: cannot remove '{target}'"))?;
        }
        Ok(None)
    }
}

/// Change permission bits, given as an octal mode.
pub struct Chmod;

impl BuiltinCommand for Chmod {
    const NAME: &'static str = "chmod";

    fn run(&self, segment: &Segment, ctx: &mut Context<'_>) -> Result<Option<String>> {
        let Some((mode, files)) = segment.params.split_first() else {
            return Err(missing_operand(Self::NAME));
        };
        if files.is_empty() {
            return Err(anyhow!("chmod: missing operand after '{mode}'"));
        }
        let bits = u32::from_str_radix(mode, 8)
            .ok()
            .filter(|bits| *bits <= 0o7777)
            .ok_or_else(|| anyhow!("chmod: invalid mode: '{mode}'"))?;
        for file in files {
            fs::set_permissions(ctx.env.resolve(file), fs::Permissions::from_mode(bits))
                .with_context(|| format!("chmod: cannot access '{file}'"))?;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_support::Fixture;
    use crate::parser::parse_pipeline;

    fn seg(line: &str) -> Segment {
        parse_pipeline(line).unwrap().remove(0)
    }

    #[test]
    fn test_cp_file_and_into_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "data").unwrap();
        fs::create_dir(temp.path().join("dir")).unwrap();
        let mut fx = Fixture::new(temp.path());

        Cp.run(&seg("cp a.txt b.txt"), &mut fx.ctx()).unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("b.txt")).unwrap(), "data");

        Cp.run(&seg("cp a.txt dir"), &mut fx.ctx()).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("dir/a.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn test_cp_directory_needs_r() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/inner")).unwrap();
        fs::write(temp.path().join("src/inner/f"), "deep").unwrap();
        let mut fx = Fixture::new(temp.path());

        let err = Cp.run(&seg("cp src copy"), &mut fx.ctx()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cp: -r not specified; omitting directory 'src'"
        );

        Cp.run(&seg("cp -r src copy"), &mut fx.ctx()).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join("copy/inner/f")).unwrap(),
            "deep"
        );
    }

    #[test]
    fn test_cp_operand_errors() {
        let temp = tempfile::tempdir().unwrap();
        let mut fx = Fixture::new(temp.path());
        assert_eq!(
            Cp.run(&seg("cp"), &mut fx.ctx()).unwrap_err().to_string(),
            "cp: missing operand"
        );
        assert_eq!(
            Cp.run(&seg("cp a"), &mut fx.ctx()).unwrap_err().to_string(),
            "cp: missing destination file operand after 'a'"
        );
        assert_eq!(
            Cp.run(&seg("cp ghost x"), &mut fx.ctx())
                .unwrap_err()
                .to_string(),
            "cp: cannot stat 'ghost'"
        );
    }

    #[test]
    fn test_mv_renames_and_moves_into_directory() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("old"), "x").unwrap();
        fs::create_dir(temp.path().join("dir")).unwrap();
        let mut fx = Fixture::new(temp.path());

        Mv.run(&seg("mv old new"), &mut fx.ctx()).unwrap();
        assert!(!temp.path().join("old").exists());
        assert!(temp.path().join("new").exists());

        Mv.run(&seg("mv new dir"), &mut fx.ctx()).unwrap();
        assert!(temp.path().join("dir/new").exists());
    }

    #[test]
    fn test_rm_files_dirs_and_force() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("f"), "x").unwrap();
        fs::create_dir_all(temp.path().join("d/e")).unwrap();
        let mut fx = Fixture::new(temp.path());

        Rm.run(&seg("rm f"), &mut fx.ctx()).unwrap();
        assert!(!temp.path().join("f").exists());

        let err = Rm.run(&seg("rm d"), &mut fx.ctx()).unwrap_err();
        assert_eq!(err.to_string(), "rm: cannot remove 'd': Is a directory");
        Rm.run(&seg("rm -r d"), &mut fx.ctx()).unwrap();
        assert!(!temp.path().join("d").exists());

        assert!(Rm.run(&seg("rm ghost"), &mut fx.ctx()).is_err());
        assert!(Rm.run(&seg("rm -f ghost"), &mut fx.ctx()).is_ok());
        assert!(Rm.run(&seg("rm"), &mut fx.ctx()).is_err());
    }

    #[test]
    fn test_chmod_sets_octal_mode() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("script.sh");
        fs::write(&file, "").unwrap();
        let mut fx = Fixture::new(temp.path());

        Chmod.run(&seg("chmod 751 script.sh"), &mut fx.ctx()).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o751);
    }

    #[test]
    fn test_chmod_rejects_bad_modes() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("f"), "").unwrap();
        let mut fx = Fixture::new(temp.path());

        for (line, msg) in [
            ("chmod 9 f", "chmod: invalid mode: '9'"),
            ("chmod 17777 f", "chmod: invalid mode: '17777'"),
            ("chmod u+x f", "chmod: invalid mode: 'u+x'"),
            ("chmod 644", "chmod: missing operand after '644'"),
            ("chmod", "chmod: missing operand"),
        ] {
            let err = Chmod.run(&seg(line), &mut fx.ctx()).unwrap_err();
            assert_eq!(err.to_string(), msg, "for {line}");
        }
    }
}
