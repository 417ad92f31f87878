use crate::error::{self, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::AttachParams;
use kube::Api;
use log::trace;
use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncReadExt};

const EXEC_SUCCESS: &str = "Success";

/// Run `command` in `container` of pod `pod_name` and return everything it wrote to stdout
/// followed by everything it wrote to stderr. A command that exits non-zero is an error.
pub async fn exec(
    api: &Api<Pod>,
    pod_name: &str,
    container: &str,
    command: &[String],
) -> Result<String> {
    trace!("exec {:?} in pod '{}'", command, pod_name);
    let params = AttachParams::default()
        .container(container)
        .stdin(false)
        .stdout(true)
        .stderr(true);
    let mut attached = api
        .exec(pod_name, command.to_vec(), &params)
        .await
        .context(error::ExecSnafu {
            command: command.to_vec(),
            pod: pod_name,
        })?;

    let stdout = attached.stdout();
    let stderr = attached.stderr();
    let status = attached.take_status();
    // Both streams are drained together so neither can stall the other.
    let (stdout, stderr) = tokio::join!(read_all(stdout), read_all(stderr));
    let mut output = stdout.context(error::ExecOutputSnafu {
        command: command.to_vec(),
        stream: "stdout",
    })?;
    output.extend(stderr.context(error::ExecOutputSnafu {
        command: command.to_vec(),
        stream: "stderr",
    })?);
    let output = String::from_utf8_lossy(&output).into_owned();

    let status = match status {
        Some(status) => status.await,
        None => None,
    };
    if let Err(e) = attached.join().await {
        return error::ExecFailedSnafu {
            command: command.to_vec(),
            pod: pod_name,
            message: e.to_string(),
        }
        .fail();
    }
    if let Some(status) = status {
        if status.status.as_deref() != Some(EXEC_SUCCESS) {
            return error::ExecFailedSnafu {
                command: command.to_vec(),
                pod: pod_name,
                message: format!(
                    "{}\n\n{}",
                    status.message.unwrap_or_default(),
                    output
                ),
            }
            .fail();
        }
    }
    Ok(output)
}

async fn read_all<R>(reader: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Split a command line on whitespace. Quoting and escaping are not supported, so arguments can
/// not contain spaces.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_on_whitespace() {
        assert_eq!(split_command_line("echo hi"), vec!["echo", "hi"]);
        assert_eq!(
            split_command_line("  cat   /etc/fluent/fluent.conf "),
            vec!["cat", "/etc/fluent/fluent.conf"]
        );
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn quotes_are_not_interpreted() {
        assert_eq!(
            split_command_line("echo 'a b'"),
            vec!["echo", "'a", "b'"]
        );
    }

    #[tokio::test]
    async fn read_all_without_stream_is_empty() {
        let none: Option<&[u8]> = None;
        assert!(read_all(none).await.unwrap().is_empty());
        assert_eq!(read_all(Some(&b"hi\n"[..])).await.unwrap(), b"hi\n");
    }
}
