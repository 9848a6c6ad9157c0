/* src/cli/core/src/generator/output.rs */

use std::io;
use std::path::{Path, PathBuf};

/// `/` -> `index.html`, `/a/b` -> `a/b/index.html`, `/a.html` -> `a.html`.
pub fn page_file(out_dir: &Path, pathname: &str) -> io::Result<PathBuf> {
  let mut file = out_dir.to_path_buf();
  for segment in pathname.split('/').filter(|s| !s.is_empty() && *s != ".") {
    if segment == ".." || segment.contains('\\') {
      return Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("pathname {pathname} leaves the output directory"),
      ));
    }
    file.push(segment);
  }
  if !pathname.ends_with(".html") {
    file.push("index.html");
  }
  Ok(file)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_pathnames_to_files() {
    let out = Path::new("build/assets");
    assert_eq!(page_file(out, "/").unwrap(), out.join("index.html"));
    assert_eq!(page_file(out, "/a/b").unwrap(), out.join("a/b/index.html"));
    assert_eq!(page_file(out, "/a/").unwrap(), out.join("a/index.html"));
    assert_eq!(page_file(out, "/404.html").unwrap(), out.join("404.html"));
  }

  #[test]
  fn refuses_to_escape() {
    assert!(page_file(Path::new("out"), "/../etc").is_err());
  }
}
