//! The registry of shipped rules.

use crate::config::{ConfigStore, GlobalOption};
use crate::rules::{
    credentials, crypto, errors, exec, filesystem, imports, injection, misc, network, Rule,
    RuleSet,
};
use rustc_hash::FxHashSet;

/// A constructible rule: identity plus factory.
pub struct RuleDef {
    /// Stable rule id.
    pub id: &'static str,
    /// Short description for listings.
    pub description: &'static str,
    /// Only registered when the `audit` global is enabled.
    pub audit_only: bool,
    /// Factory, receiving the scan configuration.
    pub create: fn(&ConfigStore) -> Box<dyn Rule>,
}

/// Every shipped rule definition, in id order.
#[must_use]
pub fn all_defs() -> Vec<RuleDef> {
    vec![
        def("G101", "Hardcoded credentials", credentials::CredentialsRule::new),
        def("G102", "Bind to all interfaces", network::BindAllInterfacesRule::new),
        def("G103", "Audit the use of unsafe", misc::UnsafeUsageRule::new),
        def("G104", "Errors unhandled", errors::UnhandledErrorRule::new),
        def("G106", "ssh.InsecureIgnoreHostKey", network::SshHostKeyRule::new),
        def("G107", "HTTP request with variable url", network::VariableUrlRule::new),
        def("G108", "Profiling endpoint exposed", imports::BlockedImportRule::pprof),
        audit_def("G109", "Integer overflow via Atoi conversion", misc::IntConversionRule::new),
        def("G110", "Decompression bomb", misc::DecompressionBombRule::new),
        def("G112", "Slowloris attack", network::SlowlorisRule::new),
        def("G114", "Serve without timeouts", network::ServeWithoutTimeoutRule::new),
        def("G201", "SQL query built from format string", injection::SqlFormatRule::new),
        def("G202", "SQL query built from concatenation", injection::SqlConcatRule::new),
        def("G203", "Unescaped template data", injection::TemplateEscapeRule::new),
        def("G204", "Subprocess with variable arguments", exec::SubprocessRule::new),
        def("G301", "Mkdir permissions", filesystem::MkdirPermRule::new),
        def("G302", "Chmod permissions", filesystem::ChmodPermRule::new),
        def("G303", "Predictable tmp file path", filesystem::SharedTmpRule::new),
        def("G304", "File path from variable", filesystem::TaintedPathRule::new),
        def("G306", "WriteFile permissions", filesystem::WriteFilePermRule::new),
        def("G401", "Weak cryptographic primitive", crypto::WeakCryptoRule::new),
        def("G402", "Insecure TLS configuration", network::TlsConfigRule::new),
        def("G403", "Weak RSA key length", crypto::RsaKeyLengthRule::new),
        def("G404", "Weak random number generator", crypto::WeakRandRule::new),
        audit_def("G501", "Import of crypto/md5", imports::BlockedImportRule::md5),
        audit_def("G502", "Import of crypto/des", imports::BlockedImportRule::des),
        audit_def("G503", "Import of crypto/rc4", imports::BlockedImportRule::rc4),
        audit_def("G504", "Import of net/http/cgi", imports::BlockedImportRule::cgi),
        audit_def("G505", "Import of crypto/sha1", imports::BlockedImportRule::sha1),
        def("G601", "Implicit memory aliasing in range loop", misc::RangeAliasRule::new),
    ]
}

fn def(
    id: &'static str,
    description: &'static str,
    create: fn(&ConfigStore) -> Box<dyn Rule>,
) -> RuleDef {
    RuleDef {
        id,
        description,
        audit_only: false,
        create,
    }
}

fn audit_def(
    id: &'static str,
    description: &'static str,
    create: fn(&ConfigStore) -> Box<dyn Rule>,
) -> RuleDef {
    RuleDef {
        id,
        description,
        audit_only: true,
        create,
    }
}

/// Keeps or drops rules by id when generating a rule set.
#[derive(Debug, Clone)]
pub struct RuleFilter {
    include: bool,
    ids: FxHashSet<String>,
}

impl RuleFilter {
    /// Keeps only the listed ids.
    #[must_use]
    pub fn include<'i>(ids: impl IntoIterator<Item = &'i str>) -> Self {
        Self {
            include: true,
            ids: ids.into_iter().map(ToOwned::to_owned).collect(),
        }
    }

    /// Drops the listed ids.
    #[must_use]
    pub fn exclude<'i>(ids: impl IntoIterator<Item = &'i str>) -> Self {
        Self {
            include: false,
            ids: ids.into_iter().map(ToOwned::to_owned).collect(),
        }
    }

    fn suppresses(&self, id: &str) -> bool {
        if self.include {
            !self.ids.contains(id)
        } else {
            self.ids.contains(id)
        }
    }
}

/// Builds the rule set for a scan. Audit-only rules register only when
/// the `audit` global is on. Filtered-out rules are dropped — unless
/// suppressions are tracked, in which case they still run and their
/// issues carry external-suppression metadata.
#[must_use]
pub fn generate(
    config: &ConfigStore,
    track_suppressions: bool,
    filters: &[RuleFilter],
) -> RuleSet {
    let audit = config.is_global_enabled(GlobalOption::Audit);
    let mut ruleset = RuleSet::new();
    for definition in all_defs() {
        if definition.audit_only && !audit {
            continue;
        }
        let suppressed = filters.iter().any(|f| f.suppresses(definition.id));
        if suppressed && !track_suppressions {
            continue;
        }
        ruleset.register((definition.create)(config), suppressed);
    }
    ruleset
}
