//! 替换规则引擎
//!
//! # 设计思路
//!
//! 规则是用户手写的 find/replace 文本，按列表顺序作用于单个字段，
//! 同一字段上的多条规则依次叠加。用户输入的正则视为不可信：
//! 编译失败或空模式只会让这一条规则被跳过，绝不会中断整个格式化流程。
//!
//! # 实现思路
//!
//! - 每条规则的执行结果用带标签的 `RuleOutcome` 表示（应用 / 跳过），
//!   调用方可选择只要字段结果（`apply`），或连同诊断信息一起拿（`apply_with_report`）。
//! - 正则通过 `fancy_regex` 编译，支持前后断言与反向引用；简单模式自动委托给 `regex`
//!   的线性引擎，需要回溯时受 `backtrack_limit` 约束，超限只让这一条规则失效。
//! - 替换模板沿用用户熟悉的 `$&`、`$1`、`$<name>`、`` $` ``、`$'` 写法，按捕获结果直接展开。

use fancy_regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::ticket::{FieldTarget, TicketFields};

/// 委托给 `regex` 的部分编译后允许的最大体积（字节）
const RULE_SIZE_LIMIT: usize = 1 << 20;

/// 单次匹配允许的最大回溯步数
const RULE_BACKTRACK_LIMIT: usize = 100_000;

/// 用户定义的替换规则
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// 正则源码；为空表示占位行，永不匹配
    pub find: String,
    pub replace: String,
    pub target: FieldTarget,
}

impl ReplacementRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>, target: FieldTarget) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            target,
        }
    }

    /// 编辑界面"添加规则"时插入的空白行
    pub fn placeholder() -> Self {
        Self::default()
    }
}

/// 规则模式无法编译
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("无效的规则模式 '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("规则模式 '{pattern}' 匹配失败: {reason}")]
    MatchFailed { pattern: String, reason: String },
}

/// 规则被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPattern,
    InvalidPattern(RuleError),
    /// 匹配过程中超出回溯上限等运行期错误，字段保持原值
    MatchFailed(RuleError),
}

/// 单条规则的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// 规则已执行，`matches` 为替换的次数（可能为 0）
    Applied { matches: usize },
    Skipped(SkipReason),
}

/// `apply_with_report` 的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    pub fields: TicketFields,
    /// 与输入规则一一对应
    pub outcomes: Vec<RuleOutcome>,
}

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .delegate_size_limit(RULE_SIZE_LIMIT)
        .backtrack_limit(RULE_BACKTRACK_LIMIT)
        .build()
        .map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// 校验单条规则的模式能否编译
///
/// 空模式视为合法（占位行）。
pub fn validate_rule(rule: &ReplacementRule) -> Result<(), RuleError> {
    if rule.find.is_empty() {
        return Ok(());
    }
    compile(&rule.find).map(|_| ())
}

/// 按 `$&` / `$1` / `$<name>` / `` $` `` / `$'` 模板展开一次匹配
///
/// - `$n`、`$nn` 只在组号存在时生效，优先取两位；未参与匹配的组展开为空串
/// - 模式没有命名组时 `$<` 按字面量保留
/// - 其余 `$` 均为字面量
fn expand_replacement(template: &str, caps: &Captures<'_>, subject: &str, has_named: bool, out: &mut String) {
    let Some(whole) = caps.get(0) else {
        return;
    };
    let group_count = caps.len().saturating_sub(1);
    let group = |n: usize| caps.get(n).map(|m| m.as_str()).unwrap_or("");

    let mut rest = template;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let mut chars = tail.chars();

        let consumed = match chars.next() {
            Some('$') => {
                out.push('$');
                1
            }
            Some('&') => {
                out.push_str(whole.as_str());
                1
            }
            Some('`') => {
                out.push_str(&subject[..whole.start()]);
                1
            }
            Some('\'') => {
                out.push_str(&subject[whole.end()..]);
                1
            }
            Some('<') if has_named => match tail[1..].find('>') {
                Some(end) => {
                    let name = &tail[1..1 + end];
                    out.push_str(caps.name(name).map(|m| m.as_str()).unwrap_or(""));
                    end + 2
                }
                None => {
                    out.push('$');
                    0
                }
            },
            Some(d1) if d1.is_ascii_digit() => {
                let first = d1.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .next()
                    .and_then(|d2| d2.to_digit(10))
                    .map(|d2| first * 10 + d2 as usize);

                if let Some(n) = two.filter(|n| (1..=group_count).contains(n)) {
                    out.push_str(group(n));
                    2
                } else if (1..=group_count).contains(&first) {
                    out.push_str(group(first));
                    1
                } else {
                    out.push('$');
                    0
                }
            }
            _ => {
                out.push('$');
                0
            }
        };

        rest = &tail[consumed..];
    }
    out.push_str(rest);
}

fn apply_one(rule: &ReplacementRule, fields: &mut TicketFields) -> RuleOutcome {
    if rule.find.is_empty() {
        return RuleOutcome::Skipped(SkipReason::EmptyPattern);
    }

    let regex = match compile(&rule.find) {
        Ok(regex) => regex,
        Err(err) => {
            log::debug!("⏭️  跳过规则（target={}）：{}", rule.target.as_str(), err);
            return RuleOutcome::Skipped(SkipReason::InvalidPattern(err));
        }
    };
    let has_named = regex.capture_names().flatten().next().is_some();

    let field = fields.get_mut(rule.target);
    let subject = field.as_str();
    let mut replaced = String::with_capacity(subject.len());
    let mut last = 0;
    let mut matches = 0;

    for caps in regex.captures_iter(subject) {
        let caps = match caps {
            Ok(caps) => caps,
            Err(e) => {
                let err = RuleError::MatchFailed {
                    pattern: rule.find.clone(),
                    reason: e.to_string(),
                };
                log::warn!("⏭️  规则执行失败（target={}）：{}", rule.target.as_str(), err);
                return RuleOutcome::Skipped(SkipReason::MatchFailed(err));
            }
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };

        replaced.push_str(&subject[last..whole.start()]);
        expand_replacement(&rule.replace, &caps, subject, has_named, &mut replaced);
        last = whole.end();
        matches += 1;
    }

    if matches > 0 {
        replaced.push_str(&subject[last..]);
        *field = replaced;
    }

    RuleOutcome::Applied { matches }
}

/// 按顺序执行全部规则，并返回每条规则的执行结果
pub fn apply_with_report(rules: &[ReplacementRule], fields: &TicketFields) -> RuleReport {
    let mut current = fields.clone();
    let outcomes = rules
        .iter()
        .map(|rule| apply_one(rule, &mut current))
        .collect();

    RuleReport {
        fields: current,
        outcomes,
    }
}

/// 按顺序执行全部规则
///
/// 同输入必得同输出；无规则时原样返回。
pub fn apply(rules: &[ReplacementRule], fields: &TicketFields) -> TicketFields {
    apply_with_report(rules, fields).fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TicketFields {
        TicketFields::new("PROJ-123", "Fix login bug", "https://x/browse/PROJ-123")
    }

    #[test]
    fn replaces_every_occurrence_in_target_only() {
        let rules = vec![ReplacementRule::new("PROJ", "JIRA", FieldTarget::Id)];
        let out = apply(&rules, &sample());

        assert_eq!(out.id, "JIRA-123");
        assert_eq!(out.url, "https://x/browse/PROJ-123");

        let rules = vec![ReplacementRule::new("o", "0", FieldTarget::Title)];
        assert_eq!(apply(&rules, &sample()).title, "Fix l0gin bug");
    }

    #[test]
    fn rules_accumulate_on_same_field() {
        let rules = vec![
            ReplacementRule::new("PROJ", "ABC", FieldTarget::Id),
            ReplacementRule::new("ABC-", "ABC#", FieldTarget::Id),
        ];
        assert_eq!(apply(&rules, &sample()).id, "ABC#123");
    }

    #[test]
    fn invalid_pattern_is_reported_and_skipped() {
        let rules = vec![
            ReplacementRule::new("[unclosed", "x", FieldTarget::Id),
            ReplacementRule::new("", "x", FieldTarget::Title),
            ReplacementRule::new("bug", "issue", FieldTarget::Title),
        ];
        let report = apply_with_report(&rules, &sample());

        assert_eq!(report.fields.id, "PROJ-123");
        assert_eq!(report.fields.title, "Fix login issue");
        assert!(matches!(
            report.outcomes[0],
            RuleOutcome::Skipped(SkipReason::InvalidPattern(_))
        ));
        assert_eq!(report.outcomes[1], RuleOutcome::Skipped(SkipReason::EmptyPattern));
        assert_eq!(report.outcomes[2], RuleOutcome::Applied { matches: 1 });
    }

    #[test]
    fn validate_rule_accepts_placeholder() {
        assert!(validate_rule(&ReplacementRule::placeholder()).is_ok());
        assert!(validate_rule(&ReplacementRule::new("(", "", FieldTarget::Id)).is_err());
    }

    fn expand(find: &str, replace: &str, id: &str) -> String {
        let rules = vec![ReplacementRule::new(find, replace, FieldTarget::Id)];
        apply(&rules, &TicketFields::new(id, "", "")).id
    }

    #[test]
    fn replacement_templates_follow_js_rules() {
        assert_eq!(expand("b", "[$&]", "abc"), "a[b]c");
        assert_eq!(expand("(b)", "$1a", "abc"), "abac");
        assert_eq!(expand("(b)", "$12", "abc"), "ab2c");
        assert_eq!(expand("b", "cost $5", "abc"), "acost $5c");
        assert_eq!(expand("b", "$$", "abc"), "a$c");
        assert_eq!(expand("b", "<$`|$'>", "abc"), "a<a|c>c");
        assert_eq!(expand("b", "$", "abc"), "a$c");
    }

    #[test]
    fn named_reference_is_literal_without_named_groups() {
        assert_eq!(expand("b", "$<x>", "abc"), "a$<x>c");
        assert_eq!(expand("(?<k>b)", "$<missing>", "abc"), "ac");
        assert_eq!(expand("(?<k>b)", "$<k", "abc"), "a$<kc");
    }

    #[test]
    fn lookbehind_rule_rewrites_id() {
        let rules = vec![ReplacementRule::new(r"(?<=PROJ-)\d+", "X", FieldTarget::Id)];
        let report = apply_with_report(&rules, &sample());

        assert_eq!(report.fields.id, "PROJ-X");
        assert_eq!(report.outcomes[0], RuleOutcome::Applied { matches: 1 });
    }

    #[test]
    fn backreference_rule_collapses_doubled_letters() {
        assert_eq!(expand(r"(\w)\1", "$1", "aabbc"), "abc");
        assert_eq!(expand(r"PROJ(?=-)", "ABC", "PROJ-1 PROJX"), "ABC-1 PROJX");
    }

    #[test]
    fn capture_groups_expand() {
        let rules = vec![ReplacementRule::new(r"([A-Z]+)-(\d+)", "$2@$1", FieldTarget::Id)];
        assert_eq!(apply(&rules, &sample()).id, "123@PROJ");

        let rules = vec![ReplacementRule::new(r"(?<n>\d+)", "#$<n>", FieldTarget::Id)];
        assert_eq!(apply(&rules, &sample()).id, "PROJ-#123");
    }

    #[test]
    fn literal_dollar_in_replacement_survives() {
        let rules = vec![ReplacementRule::new("bug", "$bug", FieldTarget::Title)];
        assert_eq!(apply(&rules, &sample()).title, "Fix login $bug");
    }
}
