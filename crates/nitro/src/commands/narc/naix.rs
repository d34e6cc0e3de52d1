//! Emission of C-style index headers enumerating an archive's contents.

use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Write `<narc>.naix` next to the packed archive: an include-guarded C
/// header with one `#define` per packed file, in allocation order.
pub fn write_header(narc_file: &Path, packed: &[String], prefix_entries: bool) -> Result<()> {
    let path = narc_file.with_extension("naix");
    info!("writing index header {}", path.display());

    let stem = narc_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    fs::write(&path, render(&stem, packed, prefix_entries))
        .into_diagnostic()
        .context(format!("writing {}", path.display()))?;

    Ok(())
}

fn render(stem: &str, packed: &[String], prefix_entries: bool) -> String {
    let stem_upper = stem.to_uppercase();

    let mut text = String::new();
    text.push_str("/*\n");
    text.push_str(" * THIS FILE WAS AUTOMATICALLY GENERATED BY nitro\n");
    text.push_str(" *              DO NOT MODIFY!!!\n");
    text.push_str(" */\n\n");
    text.push_str(&format!("#ifndef NARC_{stem_upper}_NAIX_\n"));
    text.push_str(&format!("#define NARC_{stem_upper}_NAIX_\n"));
    text.push('\n');

    for (index, rel_path) in packed.iter().enumerate() {
        let name = rel_path
            .rsplit('/')
            .next()
            .unwrap_or(rel_path)
            .replace('.', "_");

        if prefix_entries {
            text.push_str(&format!("#define NARC_{stem}_{name} {index}\n"));
        } else {
            text.push_str(&format!("#define {name} {index}\n"));
        }
    }

    text.push('\n');
    text.push_str(&format!("#endif // NARC_{stem_upper}_NAIX_\n"));

    text
}

#[cfg(test)]
mod test {
    use super::render;

    #[test]
    fn renders_include_guard_and_defines() {
        let packed = vec!["a.bin".to_owned(), "sub/c.bin".to_owned()];

        let text = render("game", &packed, false);

        assert!(text.starts_with("/*\n"));
        assert!(text.contains("#ifndef NARC_GAME_NAIX_\n"));
        assert!(text.contains("#define a_bin 0\n"));
        assert!(text.contains("#define c_bin 1\n"));
        assert!(text.ends_with("#endif // NARC_GAME_NAIX_\n"));
    }

    #[test]
    fn renders_prefixed_entries() {
        let packed = vec!["hero.bin".to_owned()];

        let text = render("game", &packed, true);

        assert!(text.contains("#define NARC_game_hero_bin 0\n"));
    }
}
