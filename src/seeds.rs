//! Built-in content: scenario labs and the command drill deck.
//! Guarantees the app is playable without any external config.

use crate::domain::{Category, Challenge, CommandCard, Difficulty, Step};

pub fn seed_scenarios() -> Vec<Challenge> {
  vec![k8s_crashloop(), docker_debug(), linux_diskfull(), git_revert()]
}

fn k8s_crashloop() -> Challenge {
  Challenge {
    id: "scenario-k8s-crashloop".into(),
    title: "Pod CrashLoopBackOff".into(),
    description: "A production pod is stuck in CrashLoopBackOff. Debug it step by step.".into(),
    category: Category::Kubernetes,
    difficulty: Difficulty::Hard,
    reward_points: 100,
    steps: vec![
      Step::new("First, check the status of all pods in the default namespace.", "kubectl get pods")
        .with_output("NAME                     READY   STATUS             RESTARTS   AGE\napi-server-7b9d4f6c-x2k  0/1     CrashLoopBackOff   5          10m\nnginx-5d6b4c7f8-abc12    1/1     Running            0          2h")
        .with_note("kubectl get pods shows pod status. CrashLoopBackOff means the container keeps crashing and Kubernetes restarts it with increasing backoff delays.")
        .with_hint("Use kubectl get to list resources"),
      Step::new("The api-server pod is crashing. Check its events and details.", "kubectl describe pod api-server-7b9d4f6c-x2k")
        .with_alternates(["kubectl describe pods api-server-7b9d4f6c-x2k"])
        .with_output("Name:         api-server-7b9d4f6c-x2k\nContainers:\n  api:\n    State:       Waiting (CrashLoopBackOff)\n    Last State:  Terminated (Exit Code 1)\n    Restart Count: 5\nEvents:\n  Warning  BackOff  1m   kubelet  Back-off restarting failed container")
        .with_note("kubectl describe shows detailed info including events. Exit code 1 is a generic application error; 137 is OOMKilled, 143 is SIGTERM.")
        .with_hint("Use kubectl describe pod <name>"),
      Step::new("Check the logs from the crashed container to see why it failed.", "kubectl logs api-server-7b9d4f6c-x2k --previous")
        .with_alternates(["kubectl logs api-server-7b9d4f6c-x2k -p"])
        .with_output("Starting API server...\nConnecting to database at postgres:5432...\nError: FATAL: password authentication failed for user \"api\"\nConnection refused. Exiting with code 1.")
        .with_note("--previous shows logs from the last crashed container instance. Without it the log may be empty if the container just restarted.")
        .with_hint("Use kubectl logs with --previous flag"),
      Step::new("The database password is wrong. Check the secret being used.", "kubectl get secret db-credentials -o yaml")
        .with_output("apiVersion: v1\nkind: Secret\nmetadata:\n  name: db-credentials\ndata:\n  password: b2xkcGFzc3dvcmQ=\n  username: YXBp")
        .with_note("Secrets hold base64-encoded data. Decoding the password reveals \"oldpassword\": it was rotated but the secret was never updated.")
        .with_hint("Use kubectl get secret <name> -o yaml"),
      Step::new("Fix the secret by updating the password. Encode the new password \"newsecurepass\" in base64 first.", "echo -n \"newsecurepass\" | base64")
        .with_output("bmV3c2VjdXJlcGFzcw==")
        .with_note("Use echo -n when encoding for secrets. A trailing newline would become part of the password.")
        .with_hint("Use echo -n with base64 encoding"),
      Step::new("Now restart the deployment to pick up the updated secret.", "kubectl rollout restart deployment api-server")
        .with_output("deployment.apps/api-server restarted")
        .with_note("kubectl rollout restart triggers a rolling restart without changing the spec, forcing pods to re-read secrets and configmaps.")
        .with_hint("Use kubectl rollout restart"),
    ],
  }
}

fn docker_debug() -> Challenge {
  Challenge {
    id: "scenario-docker-debug".into(),
    title: "Docker Container Won't Start".into(),
    description: "Your Docker container exits immediately after starting. Find and fix the issue.".into(),
    category: Category::Docker,
    difficulty: Difficulty::Medium,
    reward_points: 75,
    steps: vec![
      Step::new("Check if any containers are running or have exited recently.", "docker ps -a")
        .with_alternates(["docker ps --all"])
        .with_output("CONTAINER ID   IMAGE          STATUS                     NAMES\na1b2c3d4e5f6   myapp:latest   Exited (1) 30 seconds ago  myapp-web\nf6e5d4c3b2a1   postgres:15    Up 2 hours                 myapp-db")
        .with_note("docker ps shows only running containers. -a also lists stopped and exited ones.")
        .with_hint("Use docker ps with the -a flag"),
      Step::new("Check the logs of the exited container to see why it crashed.", "docker logs myapp-web")
        .with_output("Node.js application starting...\nError: Cannot find module '/app/server.js'\nProcess exited with code 1")
        .with_note("docker logs shows stdout and stderr from a container, even after it has stopped.")
        .with_hint("Use docker logs <container-name>"),
      Step::new("The entrypoint file is missing. Check what files are actually in the image.", "docker run --rm myapp:latest ls /app")
        .with_output("Dockerfile\nnode_modules\npackage.json\nsrc\nindex.js")
        .with_note("docker run --rm runs a one-off command and removes the container afterwards. The file is index.js, not server.js.")
        .with_hint("Use docker run --rm to execute a command in the image"),
      Step::new("Fix the Dockerfile CMD. Rebuild the image with the correct entrypoint.", "docker build -t myapp:latest .")
        .with_output("Step 6/6 : CMD [\"node\", \"index.js\"]\nSuccessfully built abc123def456\nSuccessfully tagged myapp:latest")
        .with_note("Always check that CMD/ENTRYPOINT points at files that exist in the build context.")
        .with_hint("Use docker build -t <tag> ."),
      Step::new("Start the fixed container and verify it is running.", "docker run -d --name myapp-web -p 3000:3000 myapp:latest")
        .with_output("b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7")
        .with_note("-d runs detached, --name sets a friendly name, -p maps host:container ports.")
        .with_hint("Use docker run with -d, --name, and -p flags"),
    ],
  }
}

fn linux_diskfull() -> Challenge {
  Challenge {
    id: "scenario-linux-diskfull".into(),
    title: "Server Disk Full".into(),
    description: "Production server is at 100% disk usage. Free up space before services crash.".into(),
    category: Category::Linux,
    difficulty: Difficulty::Medium,
    reward_points: 75,
    steps: vec![
      Step::new("Check disk usage across all mounted filesystems.", "df -h")
        .with_output("Filesystem      Size  Used Avail Use% Mounted on\n/dev/sda1       50G   49G  512M  99% /")
        .with_note("df -h shows filesystem usage in human-readable units. 99% on / means writes are about to fail.")
        .with_hint("Use df with the -h (human-readable) flag"),
      Step::new("Find which directories are consuming the most space.", "du -sh /* 2>/dev/null | sort -rh | head -10")
        .with_alternates(["du -sh /* | sort -rh | head -10"])
        .with_output("25G\t/var\n12G\t/home\n8G\t/usr\n2G\t/opt\n500M\t/tmp")
        .with_note("du -sh sizes directories, sort -rh orders them largest first, 2>/dev/null hides permission errors.")
        .with_hint("Use du -sh with sort to find largest directories"),
      Step::new("/var is the biggest. Drill into /var to find the culprit.", "du -sh /var/* | sort -rh | head -5")
        .with_output("22G\t/var/log\n2G\t/var/cache\n500M\t/var/lib\n100M\t/var/tmp")
        .with_note("22GB of logs. Missing log rotation is the most common cause of full disks.")
        .with_hint("Run du -sh on /var/* subdirectories"),
      Step::new("Find the largest log files in /var/log.", "find /var/log -type f -size +100M -exec ls -lh {} +")
        .with_alternates(["find /var/log -size +100M"])
        .with_output("-rw-r--r-- 1 root root 18G /var/log/app/application.log\n-rw-r--r-- 1 root root 3.5G /var/log/syslog.1")
        .with_note("find -size +100M lists files over 100MB. The 18GB application log is the problem.")
        .with_hint("Use find with -size flag to locate large files"),
      Step::new("Truncate the massive application log file to free space immediately.", "truncate -s 0 /var/log/app/application.log")
        .with_alternates(["> /var/log/app/application.log"])
        .with_note("truncate -s 0 empties a file but keeps the handle. Removing a file a process still holds open does not free the space.")
        .with_hint("Use truncate -s 0 to empty a file safely"),
    ],
  }
}

fn git_revert() -> Challenge {
  Challenge {
    id: "scenario-git-revert".into(),
    title: "Revert a Bad Production Deploy".into(),
    description: "A buggy commit was pushed to main and deployed. Revert it without losing other work.".into(),
    category: Category::Git,
    difficulty: Difficulty::Hard,
    reward_points: 100,
    steps: vec![
      Step::new("Check the recent commit history to find the bad commit.", "git log --oneline -5")
        .with_output("a1b2c3d (HEAD -> main) Merge: Add payment feature\ne4f5g6h Fix typo in README\n7h8i9j0 BUGGY: Update database config\nk1l2m3n Add user authentication\no4p5q6r Initial setup")
        .with_note("git log --oneline shows compact history; -5 limits it to the last five commits.")
        .with_hint("Use git log --oneline to see recent history"),
      Step::new("Revert the buggy commit (7h8i9j0) without modifying history.", "git revert 7h8i9j0")
        .with_output("[main r1s2t3u] Revert \"BUGGY: Update database config\"\n 1 file changed, 3 insertions(+), 3 deletions(-)")
        .with_note("git revert adds a new commit that undoes the change. Unlike git reset it never rewrites shared history.")
        .with_hint("Use git revert <commit-hash>"),
      Step::new("Verify the revert was applied correctly.", "git log --oneline -3")
        .with_output("r1s2t3u (HEAD -> main) Revert \"BUGGY: Update database config\"\na1b2c3d Merge: Add payment feature\ne4f5g6h Fix typo in README")
        .with_note("The revert commit sits on top and all earlier history is preserved.")
        .with_hint("Use git log to verify the revert commit"),
      Step::new("Push the revert to remote to deploy the fix.", "git push origin main")
        .with_output("To github.com:org/app.git\n   a1b2c3d..r1s2t3u  main -> main")
        .with_note("No force push needed: revert only adds a commit.")
        .with_hint("Use git push origin main"),
    ],
  }
}

fn card(id: &str, description: &str, command: &str, hint: &str, category: Category, difficulty: Difficulty, xp: u32) -> CommandCard {
  CommandCard {
    id: id.into(),
    description: description.into(),
    command: command.into(),
    alternates: Vec::new(),
    hint: hint.into(),
    category,
    difficulty,
    xp,
  }
}

/// The command drill deck.
pub fn seed_commands() -> Vec<CommandCard> {
  use Category::*;
  use Difficulty::*;
  vec![
    card("ls-1", "List all files including hidden ones", "ls -la", "Use ls with flags for all and long format", Linux, Easy, 10),
    card("cd-1", "Go to the home directory", "cd ~", "Tilde represents home", Linux, Easy, 10),
    card("mkdir-1", "Create a directory called \"projects\"", "mkdir projects", "mkdir creates directories", Linux, Easy, 10),
    card("chmod-1", "Make a script executable", "chmod +x script.sh", "+x adds execute permission", Linux, Medium, 15),
    card("grep-1", "Search for \"error\" in all log files", "grep error *.log", "grep searches text patterns", Linux, Medium, 15),
    card("find-1", "Find all .txt files in current directory", "find . -name \"*.txt\"", "find with -name pattern", Linux, Medium, 15),
    card("ps-1", "Show all running processes", "ps aux", "ps with aux shows all processes", Linux, Easy, 10),
    card("kill-1", "Force kill process with PID 1234", "kill -9 1234", "-9 is SIGKILL", Linux, Medium, 15),
    card("git-1", "Initialize a new git repository", "git init", "init starts a new repo", Git, Easy, 10),
    card("git-2", "Stage all changes for commit", "git add .", "add . stages everything", Git, Easy, 10),
    card("git-3", "Commit with message \"Initial commit\"", "git commit -m \"Initial commit\"", "-m adds inline message", Git, Easy, 10),
    card("git-4", "Create and switch to branch \"feature\"", "git checkout -b feature", "-b creates new branch", Git, Medium, 15),
    card("git-5", "Push to origin main branch", "git push origin main", "push to remote origin", Git, Easy, 10),
    card("git-6", "Rebase current branch onto main", "git rebase main", "rebase replays commits", Git, Hard, 25),
    card("docker-1", "List all running containers", "docker ps", "ps shows containers", Docker, Easy, 10),
    card("docker-2", "Pull the nginx image", "docker pull nginx", "pull downloads images", Docker, Easy, 10),
    card("docker-3", "Run nginx container on port 8080", "docker run -p 8080:80 nginx", "-p maps ports host:container", Docker, Medium, 15),
    card("docker-4", "Build image with tag \"myapp:latest\"", "docker build -t myapp:latest .", "-t sets the tag", Docker, Medium, 15),
    card("docker-5", "Stop container with ID abc123", "docker stop abc123", "stop gracefully stops containers", Docker, Easy, 10),
    card("docker-6", "Remove all stopped containers", "docker container prune", "prune removes stopped containers", Docker, Medium, 15),
    card("k8s-1", "Get all pods in current namespace", "kubectl get pods", "get lists resources", Kubernetes, Easy, 10),
    card("k8s-2", "Apply a configuration file", "kubectl apply -f config.yaml", "-f specifies file", Kubernetes, Easy, 10),
    card("k8s-3", "Describe pod named \"web-server\"", "kubectl describe pod web-server", "describe shows detailed info", Kubernetes, Medium, 15),
    card("k8s-4", "Get logs from pod \"api-server\"", "kubectl logs api-server", "logs shows container output", Kubernetes, Easy, 10),
    card("k8s-5", "Scale deployment \"web\" to 3 replicas", "kubectl scale deployment web --replicas=3", "scale changes replica count", Kubernetes, Medium, 15),
    card("k8s-6", "Execute bash in pod \"debug\"", "kubectl exec -it debug -- bash", "exec runs commands in containers", Kubernetes, Hard, 25),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn seed_scenarios_are_valid() {
    for c in seed_scenarios() {
      c.validate().unwrap_or_else(|e| panic!("{}: {e}", c.id));
    }
  }

  #[test]
  fn seed_command_ids_are_unique() {
    let cards = seed_commands();
    let ids: HashSet<_> = cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), cards.len());
    assert_eq!(cards.iter().filter(|c| c.category == Category::Kubernetes).count(), 6);
  }
}
