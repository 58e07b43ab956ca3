//! Curated channel list loader
//!
//! One channel per line, `CHANNEL_ID|Display Name` or a bare channel id.
//! Blank and malformed lines are skipped, not fatal.

use crate::error::Result;
use crate::types::ChannelId;
use tokio::fs;

/// Load the channel list from file. A missing file is an error; a file
/// with skippable lines is not.
pub async fn load_channels(path: &str) -> Result<Vec<ChannelId>> {
    let content = fs::read_to_string(path).await?;
    let channels = parse_channels(&content);
    tracing::info!(
        count = channels.len(),
        file = path,
        "loaded channel list"
    );
    Ok(channels)
}

fn parse_channels(content: &str) -> Vec<ChannelId> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match line.split_once('|') {
                Some((id, name)) => {
                    let id = id.trim();
                    let name = name.trim();
                    if id.is_empty() {
                        tracing::warn!(line, "skipping malformed channel line");
                        return None;
                    }
                    Some(ChannelId {
                        id: id.to_string(),
                        name: (!name.is_empty()).then(|| name.to_string()),
                    })
                }
                None => Some(ChannelId {
                    id: line.to_string(),
                    name: None,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_id_and_name() {
        let channels = parse_channels("UCabc123|Clash Champs\nUCdef456|Base Hub\n");
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, "UCabc123");
        assert_eq!(channels[0].label(), "Clash Champs");
    }

    #[test]
    fn test_bare_id_lines_are_accepted() {
        let channels = parse_channels("UCabc123\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].label(), "UCabc123");
    }

    #[test]
    fn test_blank_and_malformed_lines_are_skipped() {
        let channels = parse_channels("\n  \n|no id here\nUCabc123|Ok\n");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "UCabc123");
    }

    #[test]
    fn test_order_is_preserved() {
        let channels = parse_channels("UCb\nUCa\nUCc\n");
        let ids: Vec<_> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["UCb", "UCa", "UCc"]);
    }
}
