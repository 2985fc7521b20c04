//! Rules for consumer chains secured by a provider chain.

use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::keepers::ConsumerKeeper;
use crate::tx::{Msg, Tx};

/// Until the provider channel exists only IBC messages are accepted, so the
/// chain can finish its handshake before anything else runs.
pub struct MsgFilterDecorator {
    consumer: Arc<dyn ConsumerKeeper>,
}

impl MsgFilterDecorator {
    pub fn new(consumer: Arc<dyn ConsumerKeeper>) -> Self {
        Self { consumer }
    }
}

impl AnteDecorator for MsgFilterDecorator {
    fn step(&self) -> Step {
        Step::MsgFilter
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if self.consumer.provider_channel(&ctx).is_none()
            && !tx.msgs().iter().all(|m| m.type_url().starts_with("/ibc."))
        {
            return Err(AnteError::UnsupportedMessages {
                height: ctx.block_height(),
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Rejects messages from modules a consumer chain does not run, e.g.
/// slashing and evidence, which the provider handles.
#[derive(Debug, Clone)]
pub struct DisabledModulesDecorator {
    prefixes: Vec<String>,
}

impl DisabledModulesDecorator {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    fn find_disabled<'a>(&self, msgs: &'a [Msg]) -> Option<&'a str> {
        msgs.iter().find_map(|msg| match msg {
            Msg::Exec { msgs, .. } => self.find_disabled(msgs),
            other => {
                let url = other.type_url();
                self.prefixes
                    .iter()
                    .any(|p| url.starts_with(p.as_str()))
                    .then_some(url)
            }
        })
    }
}

impl AnteDecorator for DisabledModulesDecorator {
    fn step(&self) -> Step {
        Step::DisabledModules
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if let Some(url) = self.find_disabled(tx.msgs()) {
            return Err(AnteError::DisabledModule {
                type_url: url.to_string(),
                height: ctx.block_height(),
            });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Limits governance proposals to whitelisted messages and legacy content.
#[derive(Debug, Clone)]
pub struct ForbiddenProposalsDecorator {
    legacy_whitelist: Vec<String>,
    msg_whitelist: Vec<String>,
}

impl ForbiddenProposalsDecorator {
    pub fn new(legacy_whitelist: Vec<String>, msg_whitelist: Vec<String>) -> Self {
        Self {
            legacy_whitelist,
            msg_whitelist,
        }
    }

    fn forbidden<'a>(&self, proposal: &'a [Msg]) -> Option<&'a str> {
        proposal.iter().find_map(|msg| match msg {
            Msg::ExecLegacyContent {
                content_type_url, ..
            } => (!self.legacy_whitelist.contains(content_type_url))
                .then_some(content_type_url.as_str()),
            other => {
                let url = other.type_url();
                (!self.msg_whitelist.iter().any(|w| w == url)).then_some(url)
            }
        })
    }
}

impl AnteDecorator for ForbiddenProposalsDecorator {
    fn step(&self) -> Step {
        Step::ForbiddenProposals
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for msg in tx.msgs() {
            if let Msg::SubmitProposal { messages, .. } = msg {
                if let Some(url) = self.forbidden(messages) {
                    return Err(AnteError::ForbiddenProposal {
                        type_url: url.to_string(),
                        height: ctx.block_height(),
                    });
                }
            }
        }
        next.run(ctx, tx, simulate)
    }
}
