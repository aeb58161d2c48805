// Job role fit (group top-3 summary).
//
// Each configured role is scored as a weighted sum of the four axis scores
// plus a small monotonic boost when the arc level clears the role's minimum.
// Group score is the maximum role score within the group; the top three
// groups feed the summary lines and the role-aligned interpretation.

use super::clamp01;
use crate::error::DeriveError;
use crate::models::{NeuprintAxes, RfsReport, RoleConfig, RoleMinRequirements, TopGroup};

#[derive(Debug, Clone, Copy)]
pub struct JobGroup {
    pub group_id: u32,
    pub group_name: &'static str,
    pub job_id: &'static str,
    pub job_name: &'static str,
}

macro_rules! job {
    ($gid:expr, $gname:expr, $jid:expr, $jname:expr) => {
        JobGroup {
            group_id: $gid,
            group_name: $gname,
            job_id: $jid,
            job_name: $jname,
        }
    };
}

pub const JOB_GROUPS: &[JobGroup] = &[
    job!(1, "Strategy·Analysis·Policy", "strategy_analyst", "Strategy Analyst"),
    job!(1, "Strategy·Analysis·Policy", "management_analyst", "Management Analyst"),
    job!(1, "Strategy·Analysis·Policy", "policy_analyst", "Policy Analyst"),
    job!(1, "Strategy·Analysis·Policy", "economic_researcher", "Economic Researcher"),
    job!(1, "Strategy·Analysis·Policy", "financial_analyst", "Financial Analyst"),
    job!(1, "Strategy·Analysis·Policy", "risk_analyst", "Risk Analyst"),
    job!(1, "Strategy·Analysis·Policy", "compliance_officer", "Compliance Officer"),
    job!(1, "Strategy·Analysis·Policy", "internal_auditor", "Internal Auditor"),
    job!(2, "Data·AI·Intelligence", "data_analyst", "Data Analyst"),
    job!(2, "Data·AI·Intelligence", "data_scientist", "Data Scientist"),
    job!(2, "Data·AI·Intelligence", "business_intelligence_analyst", "Business Intelligence Analyst"),
    job!(2, "Data·AI·Intelligence", "machine_learning_analyst", "Machine Learning Analyst"),
    job!(2, "Data·AI·Intelligence", "statistician", "Statistician"),
    job!(2, "Data·AI·Intelligence", "operations_research_analyst", "Operations Research Analyst"),
    job!(2, "Data·AI·Intelligence", "information_security_analyst", "Information Security Analyst"),
    job!(3, "Engineering·Technology·Architecture", "software_engineer", "Software Engineer"),
    job!(3, "Engineering·Technology·Architecture", "systems_architect", "Systems Architect"),
    job!(3, "Engineering·Technology·Architecture", "cloud_engineer", "Cloud Engineer"),
    job!(3, "Engineering·Technology·Architecture", "devops_engineer", "DevOps Engineer"),
    job!(3, "Engineering·Technology·Architecture", "network_architect", "Network Architect"),
    job!(3, "Engineering·Technology·Architecture", "qa_engineer", "QA Engineer"),
    job!(3, "Engineering·Technology·Architecture", "safety_systems_engineer", "Safety Systems Engineer"),
    job!(4, "Product·Service·Innovation", "product_manager", "Product Manager"),
    job!(4, "Product·Service·Innovation", "service_designer", "Service Designer"),
    job!(4, "Product·Service·Innovation", "ux_planner", "UX Planner"),
    job!(4, "Product·Service·Innovation", "business_developer", "Business Developer"),
    job!(4, "Product·Service·Innovation", "innovation_manager", "Innovation Manager"),
    job!(4, "Product·Service·Innovation", "r_and_d_planner", "R&D Planner"),
    job!(4, "Product·Service·Innovation", "new_venture_strategist", "New Venture Strategist"),
    job!(5, "Education·Research·Training", "teacher", "Teacher"),
    job!(5, "Education·Research·Training", "professor", "Professor"),
    job!(5, "Education·Research·Training", "instructional_designer", "Instructional Designer"),
    job!(5, "Education·Research·Training", "education_consultant", "Education Consultant"),
    job!(5, "Education·Research·Training", "research_scientist", "Research Scientist"),
    job!(5, "Education·Research·Training", "research_coordinator", "Research Coordinator"),
    job!(5, "Education·Research·Training", "academic_advisor", "Academic Advisor"),
    job!(6, "Psychology·Counseling·Social Care", "counselor", "Counselor"),
    job!(6, "Psychology·Counseling·Social Care", "clinical_psychologist", "Clinical Psychologist"),
    job!(6, "Psychology·Counseling·Social Care", "school_psychologist", "School Psychologist"),
    job!(6, "Psychology·Counseling·Social Care", "social_worker", "Social Worker"),
    job!(6, "Psychology·Counseling·Social Care", "behavioral_therapist", "Behavioral Therapist"),
    job!(6, "Psychology·Counseling·Social Care", "rehabilitation_specialist", "Rehabilitation Specialist"),
    job!(7, "Leadership·Executive·Public Governance", "ceo_coo_cso", "CEO / COO / CSO"),
    job!(7, "Leadership·Executive·Public Governance", "public_policy_director", "Public Policy Director"),
    job!(7, "Leadership·Executive·Public Governance", "government_administrator", "Government Administrator"),
    job!(7, "Leadership·Executive·Public Governance", "program_director", "Program Director"),
    job!(7, "Leadership·Executive·Public Governance", "public_strategy_lead", "Public Strategy Lead"),
    job!(8, "Marketing·Sales·Communication", "marketing_strategist", "Marketing Strategist"),
    job!(8, "Marketing·Sales·Communication", "brand_manager", "Brand Manager"),
    job!(8, "Marketing·Sales·Communication", "sales_director", "Sales Director"),
    job!(8, "Marketing·Sales·Communication", "pr_manager", "PR Manager"),
    job!(8, "Marketing·Sales·Communication", "communication_manager", "Communication Manager"),
    job!(8, "Marketing·Sales·Communication", "media_planner", "Media Planner"),
    job!(8, "Marketing·Sales·Communication", "digital_marketer", "Digital Marketer"),
    job!(9, "Design·Content·Media", "ux_ui_designer", "UX/UI Designer"),
    job!(9, "Design·Content·Media", "graphic_designer", "Graphic Designer"),
    job!(9, "Design·Content·Media", "video_producer", "Video Producer"),
    job!(9, "Design·Content·Media", "content_strategist", "Content Strategist"),
    job!(9, "Design·Content·Media", "creative_director", "Creative Director"),
    job!(9, "Design·Content·Media", "editor", "Editor"),
    job!(9, "Design·Content·Media", "multimedia_artist", "Multimedia Artist"),
    job!(10, "Healthcare·Life Science", "physician", "Physician"),
    job!(10, "Healthcare·Life Science", "nurse", "Nurse"),
    job!(10, "Healthcare·Life Science", "medical_researcher", "Medical Researcher"),
    job!(10, "Healthcare·Life Science", "clinical_data_manager", "Clinical Data Manager"),
    job!(10, "Healthcare·Life Science", "biomedical_scientist", "Biomedical Scientist"),
    job!(10, "Healthcare·Life Science", "public_health_analyst", "Public Health Analyst"),
    job!(11, "Law·Compliance·Ethics", "lawyer", "Lawyer"),
    job!(11, "Law·Compliance·Ethics", "legal_researcher", "Legal Researcher"),
    job!(11, "Law·Compliance·Ethics", "compliance_manager", "Compliance Manager"),
    job!(11, "Law·Compliance·Ethics", "ethics_officer", "Ethics Officer"),
    job!(11, "Law·Compliance·Ethics", "regulatory_affairs_specialist", "Regulatory Affairs Specialist"),
    job!(11, "Law·Compliance·Ethics", "contract_specialist", "Contract Specialist"),
    job!(12, "Operations·Quality·Safety·Logistics", "operations_manager", "Operations Manager"),
    job!(12, "Operations·Quality·Safety·Logistics", "quality_manager", "Quality Manager"),
    job!(12, "Operations·Quality·Safety·Logistics", "safety_engineer", "Safety Engineer"),
    job!(12, "Operations·Quality·Safety·Logistics", "process_analyst", "Process Analyst"),
    job!(12, "Operations·Quality·Safety·Logistics", "supply_chain_analyst", "Supply Chain Analyst"),
    job!(12, "Operations·Quality·Safety·Logistics", "logistics_planner", "Logistics Planner"),
    job!(13, "Finance·Investment·Insurance", "investment_analyst", "Investment Analyst"),
    job!(13, "Finance·Investment·Insurance", "portfolio_manager", "Portfolio Manager"),
    job!(13, "Finance·Investment·Insurance", "credit_analyst", "Credit Analyst"),
    job!(13, "Finance·Investment·Insurance", "actuary", "Actuary"),
    job!(13, "Finance·Investment·Insurance", "insurance_underwriter", "Insurance Underwriter"),
    job!(13, "Finance·Investment·Insurance", "treasury_manager", "Treasury Manager"),
    job!(14, "Culture·HR·Organization", "hr_manager", "HR Manager"),
    job!(14, "Culture·HR·Organization", "talent_manager", "Talent Manager"),
    job!(14, "Culture·HR·Organization", "organizational_development_manager", "Organizational Development Manager"),
    job!(14, "Culture·HR·Organization", "culture_manager", "Culture Manager"),
    job!(14, "Culture·HR·Organization", "recruiter", "Recruiter"),
    job!(14, "Culture·HR·Organization", "learning_and_development_specialist", "Learning & Development Specialist"),
    job!(15, "Automation·Digital Agent", "rpa_agent", "RPA Agent"),
    job!(15, "Automation·Digital Agent", "chatbot_operator", "Chatbot Operator"),
    job!(15, "Automation·Digital Agent", "automated_qa_bot", "Automated QA Bot"),
    job!(15, "Automation·Digital Agent", "report_generation_agent", "Report Generation Agent"),
    job!(15, "Automation·Digital Agent", "monitoring_ai", "Monitoring AI"),
];

fn job_by_id(job_id: &str) -> Option<&'static JobGroup> {
    JOB_GROUPS.iter().find(|j| j.job_id == job_id)
}

/// Built-in catalog used when the caller supplies no role configs. Keeps the
/// output stable and non-empty without changing any scoring formulas.
pub fn default_role_configs() -> Vec<RoleConfig> {
    let cfg = |role_code: &str,
               job_id: &str,
               onet_code: &str,
               skills: &[&str],
               weights: (f64, f64, f64, f64),
               arc_level: f64| RoleConfig {
        role_code: role_code.to_string(),
        job_id: job_id.to_string(),
        onet_code: onet_code.to_string(),
        oecd_core_skills: skills.iter().map(|s| s.to_string()).collect(),
        neuprint_axes_weights: NeuprintAxes {
            analyticity: weights.0,
            flow: weights.1,
            metacognition: weights.2,
            authenticity: weights.3,
        },
        min_requirements: RoleMinRequirements {
            arc_level,
            ..RoleMinRequirements::default()
        },
    };

    vec![
        cfg(
            "RFS-STRAT-001",
            "strategy_analyst",
            "13-1111.00",
            &["analysis", "strategy", "policy"],
            (0.10, 0.04, 0.00, 0.86),
            4.0,
        ),
        cfg(
            "RFS-DATA-001",
            "data_scientist",
            "15-2051.00",
            &["data", "modeling", "inference"],
            (0.30, 0.20, 0.10, 0.40),
            3.0,
        ),
        cfg(
            "RFS-ARCH-001",
            "systems_architect",
            "15-1299.08",
            &["architecture", "systems", "engineering"],
            (0.20, 0.25, 0.35, 0.20),
            3.0,
        ),
    ]
}

#[derive(Debug, Clone, Copy)]
pub struct RoleFitInput {
    pub axes: NeuprintAxes,
    pub arc_level: f64,
}

fn is_finite01(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}

fn assert_axes01(axes: &NeuprintAxes, label: &str) -> Result<(), DeriveError> {
    let pairs = [
        ("analyticity", axes.analyticity),
        ("flow", axes.flow),
        ("metacognition", axes.metacognition),
        ("authenticity", axes.authenticity),
    ];
    for (k, v) in pairs {
        if !is_finite01(v) {
            return Err(DeriveError::Configuration(format!(
                "{label}.{k} must be in [0,1]. Got: {v}"
            )));
        }
    }
    Ok(())
}

fn validate_weights(weights: &NeuprintAxes) -> Result<(), DeriveError> {
    assert_axes01(weights, "neuprint_axes_weights")?;
    let sum = weights.analyticity + weights.flow + weights.metacognition + weights.authenticity;
    if (sum - 1.0).abs() > 1e-6 {
        return Err(DeriveError::Configuration(format!(
            "neuprint_axes_weights must sum to 1.0. Got sum={sum:.6}"
        )));
    }
    Ok(())
}

fn arc_boost(user_arc: f64, min_arc: f64) -> f64 {
    if !user_arc.is_finite() || !min_arc.is_finite() {
        return 0.0;
    }
    if user_arc < min_arc {
        return 0.0;
    }
    let delta = user_arc - min_arc;
    clamp01((0.02 + 0.01 * (delta - 1.0).max(0.0)).min(0.04))
}

fn meets_min_requirements(input: &RoleFitInput, cfg: &RoleConfig) -> bool {
    if input.arc_level < cfg.min_requirements.arc_level {
        return false;
    }
    let req = &cfg.min_requirements;
    let a = &input.axes;
    if req.analyticity.map_or(false, |m| a.analyticity < m) {
        return false;
    }
    if req.flow.map_or(false, |m| a.flow < m) {
        return false;
    }
    if req.metacognition.map_or(false, |m| a.metacognition < m) {
        return false;
    }
    if req.authenticity.map_or(false, |m| a.authenticity < m) {
        return false;
    }
    true
}

fn score_role_fit(input: &RoleFitInput, cfg: &RoleConfig) -> Result<f64, DeriveError> {
    assert_axes01(&input.axes, "input.axes")?;
    validate_weights(&cfg.neuprint_axes_weights)?;

    let w = &cfg.neuprint_axes_weights;
    let a = &input.axes;
    let base = a.analyticity * w.analyticity
        + a.flow * w.flow
        + a.metacognition * w.metacognition
        + a.authenticity * w.authenticity;

    Ok(clamp01(base + arc_boost(input.arc_level, cfg.min_requirements.arc_level)))
}

fn roles_in_group(group_name: &str) -> Vec<String> {
    JOB_GROUPS
        .iter()
        .filter(|j| j.group_name == group_name)
        .map(|j| j.job_name.to_string())
        .collect()
}

fn group_interpretation(group_id: u32) -> Option<&'static str> {
    match group_id {
        1 => Some("Strong in conceptual structuring and strategic direction setting, this profile is well suited for designing large-scale frameworks and guiding decision alignment across complex constraints."),
        2 => Some("Demonstrates data-oriented reasoning with strong pattern extraction and hypothesis testing capacity, making it effective for analytical modeling and evidence-driven problem solving."),
        3 => Some("Shows strength in system architecture and technical integration thinking, enabling efficient translation of requirements into structured, scalable solutions."),
        4 => Some("Excels in problem framing and value-oriented design, combining user perspective with iterative experimentation to refine innovative solutions."),
        5 => Some("Strong in knowledge structuring and explanatory reasoning, supporting effective learning design, conceptual clarity, and instructional organization."),
        6 => Some("Demonstrates contextual interpretation and interpersonal sensitivity, enabling adaptive responses to human behavior and emotionally grounded decision processes."),
        7 => Some("Shows integrative decision-making ability across multiple priorities, supporting leadership roles that require coordination, resource alignment, and long-term direction setting."),
        8 => Some("Strong in persuasive communication and audience-oriented reasoning, enabling effective message framing, influence strategies, and engagement optimization."),
        9 => Some("Demonstrates expressive structuring ability, translating abstract ideas into concrete forms and experiences through visual and narrative organization."),
        10 => Some("Exhibits evidence-based judgment and risk-aware reasoning, supporting decision making in environments requiring accuracy, safety, and procedural reliability."),
        11 => Some("Strong in rule-based reasoning and logical consistency evaluation, enabling precise interpretation of requirements, regulations, and structured argumentation."),
        12 => Some("Shows process optimization and operational stability thinking, supporting efficient workflow design, quality management, and error prevention."),
        13 => Some("Demonstrates quantitative judgment and probabilistic reasoning, enabling structured evaluation of risk, return, and financial decision scenarios."),
        14 => Some("Strong in organizational dynamics interpretation and human system design, supporting talent development, cultural alignment, and team effectiveness."),
        15 => Some("Shows procedural structuring and automation-oriented reasoning, enabling efficient decomposition of tasks into repeatable and monitorable workflows."),
        _ => None,
    }
}

/// Top-3 group summary. Roles failing minimum requirements are filtered when
/// `strict_min_filter` is set; if that empties the pool, all roles compete.
pub fn compute_group_top3(
    input: &RoleFitInput,
    role_configs: &[RoleConfig],
    strict_min_filter: bool,
) -> Result<RfsReport, DeriveError> {
    struct Scored {
        group_id: u32,
        group_name: &'static str,
        job_name: &'static str,
        ok: bool,
        score: f64,
    }

    let mut role_scored: Vec<Scored> = Vec::with_capacity(role_configs.len());
    for cfg in role_configs {
        let job = job_by_id(&cfg.job_id).ok_or_else(|| {
            DeriveError::Configuration(format!(
                "RoleConfig.job_id not found in JOB_INDEX: {}",
                cfg.job_id
            ))
        })?;
        role_scored.push(Scored {
            group_id: job.group_id,
            group_name: job.group_name,
            job_name: job.job_name,
            ok: meets_min_requirements(input, cfg),
            score: score_role_fit(input, cfg)?,
        });
    }

    let strict_pool: Vec<&Scored> = if strict_min_filter {
        role_scored.iter().filter(|x| x.ok).collect()
    } else {
        role_scored.iter().collect()
    };
    let final_pool: Vec<&Scored> = if strict_pool.is_empty() {
        role_scored.iter().collect()
    } else {
        strict_pool
    };

    // Group score: max role score within the group.
    let mut group_best: Vec<(u32, &'static str, f64, &'static str)> = Vec::new();
    for r in &final_pool {
        match group_best.iter_mut().find(|g| g.1 == r.group_name) {
            Some(g) => {
                if r.score > g.2 {
                    g.2 = r.score;
                    g.3 = r.job_name;
                }
            }
            None => group_best.push((r.group_id, r.group_name, clamp01(r.score), r.job_name)),
        }
    }

    group_best.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    group_best.truncate(3);

    let summary_lines: Vec<String> = group_best
        .iter()
        .map(|g| format!("{}: {}%", g.1, (g.2 * 100.0).round() as i64))
        .collect();

    let top_groups: Vec<TopGroup> = group_best
        .iter()
        .map(|g| TopGroup {
            group_name: g.1.to_string(),
            percent: (g.2 * 100.0).round() as u32,
            roles: roles_in_group(g.1),
            recommended_role: g.3.to_string(),
        })
        .collect();

    let recommended_roles_top3: Vec<String> = top_groups
        .iter()
        .map(|g| g.recommended_role.clone())
        .collect();
    let recommended_roles_line = format!(
        "Recommended roles include: {}.",
        recommended_roles_top3.join(", ")
    );

    let pattern_interpretation = match group_best.first() {
        Some(top1) => group_interpretation(top1.0)
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                format!(
                    "Role fit is most aligned with {}, with strongest match for {}.",
                    top1.1, top1.3
                )
            }),
        None => String::new(),
    };

    Ok(RfsReport {
        summary_lines,
        top_groups,
        recommended_roles_top3,
        recommended_roles_line,
        pattern_interpretation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(a: f64, f: f64, m: f64, au: f64) -> NeuprintAxes {
        NeuprintAxes {
            analyticity: a,
            flow: f,
            metacognition: m,
            authenticity: au,
        }
    }

    #[test]
    fn test_arc_boost_schedule() {
        assert_eq!(arc_boost(2.0, 3.0), 0.0);
        assert_eq!(arc_boost(3.0, 3.0), 0.02);
        assert_eq!(arc_boost(4.0, 3.0), 0.02);
        assert_eq!(arc_boost(5.0, 3.0), 0.03);
        assert_eq!(arc_boost(8.0, 3.0), 0.04);
    }

    #[test]
    fn test_weight_validation() {
        let input = RoleFitInput {
            axes: axes(0.5, 0.5, 0.5, 0.5),
            arc_level: 3.0,
        };
        let mut cfg = default_role_configs().remove(1);
        cfg.neuprint_axes_weights.analyticity = 0.9;
        let err = score_role_fit(&input, &cfg).unwrap_err();
        assert!(err.to_string().contains("must sum to 1.0"));
    }

    #[test]
    fn test_axes_out_of_range_rejected() {
        let input = RoleFitInput {
            axes: axes(1.2, 0.5, 0.5, 0.5),
            arc_level: 3.0,
        };
        let cfg = default_role_configs().remove(1);
        let err = score_role_fit(&input, &cfg).unwrap_err();
        assert!(err.to_string().contains("input.axes.analyticity"));
    }

    #[test]
    fn test_unknown_job_id_is_configuration_error() {
        let input = RoleFitInput {
            axes: axes(0.5, 0.5, 0.5, 0.5),
            arc_level: 3.0,
        };
        let mut cfg = default_role_configs().remove(1);
        cfg.job_id = "astronaut".to_string();
        let err = compute_group_top3(&input, &[cfg], true).unwrap_err();
        assert!(err.to_string().contains("astronaut"));
    }

    #[test]
    fn test_strict_filter_fallback() {
        // Arc level 1 fails every default minimum; the pool falls back to
        // all roles instead of producing an empty report.
        let input = RoleFitInput {
            axes: axes(0.5, 0.5, 0.5, 0.5),
            arc_level: 1.0,
        };
        let out = compute_group_top3(&input, &default_role_configs(), true).unwrap();
        assert_eq!(out.top_groups.len(), 3);
        assert!(!out.recommended_roles_line.is_empty());
    }

    #[test]
    fn test_top3_ordering_and_lines() {
        // Authenticity-heavy axes favor the strategy analyst config.
        let input = RoleFitInput {
            axes: axes(0.3, 0.3, 0.3, 0.95),
            arc_level: 4.0,
        };
        let out = compute_group_top3(&input, &default_role_configs(), true).unwrap();
        assert_eq!(out.top_groups[0].group_name, "Strategy·Analysis·Policy");
        assert_eq!(out.top_groups[0].recommended_role, "Strategy Analyst");
        assert!(out.summary_lines[0].starts_with("Strategy·Analysis·Policy: "));
        assert!(out
            .pattern_interpretation
            .starts_with("Strong in conceptual structuring"));
        assert!(out.top_groups[0].roles.contains(&"Policy Analyst".to_string()));
    }

    #[test]
    fn test_group_aggregation_takes_max() {
        // Two roles in the same group: the better one becomes recommended.
        let mut cfgs = default_role_configs();
        let mut second = cfgs[1].clone();
        second.job_id = "data_analyst".to_string();
        second.neuprint_axes_weights = axes(1.0, 0.0, 0.0, 0.0);
        cfgs.push(second);

        let input = RoleFitInput {
            axes: axes(0.9, 0.1, 0.1, 0.1),
            arc_level: 3.0,
        };
        let out = compute_group_top3(&input, &cfgs, false).unwrap();
        let data_group = out
            .top_groups
            .iter()
            .find(|g| g.group_name == "Data·AI·Intelligence")
            .unwrap();
        assert_eq!(data_group.recommended_role, "Data Analyst");
    }
}
