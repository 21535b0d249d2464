use std::{fs, path::Path, process::Command};

fn main() {
  // Tell Cargo to rerun this script if git state changes
  println!("cargo:rerun-if-changed=.git/HEAD");
  if Path::new(".git/refs/heads").exists() {
    println!("cargo:rerun-if-changed=.git/refs/heads");
  }

  let git_info = get_git_info();

  let short = git_info.commit.get(..7).unwrap_or(&git_info.commit);
  println!("cargo:rustc-env=GIT_BRANCH={}", git_info.branch);
  println!("cargo:rustc-env=GIT_COMMIT={}", git_info.commit);
  println!("cargo:rustc-env=GIT_COMMIT_SHORT={}", short);
}

struct GitInfo {
  branch: String,
  commit: String,
}

fn git(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn get_git_info() -> GitInfo {
  let mut info = GitInfo {
    branch: git(&["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_else(|| "unknown".to_string()),
    commit: git(&["rev-parse", "HEAD"]).unwrap_or_else(|| "unknown".to_string()),
  };

  // Fallback to manual parsing if still unknown
  if info.commit == "unknown" || info.branch == "unknown" {
    if let Ok(head) = fs::read_to_string(".git/HEAD") {
      if head.starts_with("ref: ") {
        let ref_path = head.trim_start_matches("ref: ").trim();
        info.branch = ref_path.rsplit('/').next().unwrap_or("unknown").to_string();

        let full_ref_path = format!(".git/{}", ref_path);
        if let Ok(commit) = fs::read_to_string(full_ref_path) {
          info.commit = commit.trim().to_string();
        }
      } else {
        info.commit = head.trim().to_string();
      }
    }
  }

  info
}
