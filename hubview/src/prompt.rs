// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use hubview_contracts::{Prompt, PromptDecision};
use hubview_types::DeviceRef;

/// Answers prompts from values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticPrompt {
    device_name: Option<String>,
    confirm: bool,
}

impl StaticPrompt {
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            confirm: false,
        }
    }

    pub fn confirming(confirm: bool) -> Self {
        Self {
            device_name: None,
            confirm,
        }
    }
}

#[async_trait]
impl Prompt for StaticPrompt {
    async fn request_device_name(&self, _hub_name: &str) -> PromptDecision<String> {
        match &self.device_name {
            Some(name) => PromptDecision::Accept(name.clone()),
            None => PromptDecision::Cancel,
        }
    }

    async fn confirm_delete(&self, device: &DeviceRef) -> PromptDecision<()> {
        if self.confirm {
            PromptDecision::Accept(())
        } else {
            tracing::debug!(%device, "delete not confirmed");
            PromptDecision::Cancel
        }
    }
}
