//! Deterministic business-letter template used whenever generation fails.

use crate::email::context::{finalize_subject, ApplicationContext, GeneratedEmail};

pub fn fallback_email(ctx: &ApplicationContext) -> GeneratedEmail {
    let subject = finalize_subject(&format!(
        "Application for {} – {}",
        ctx.job_role, ctx.name
    ));

    let body = format!(
        "Dear {hr_name},\n\
        \n\
        I am writing to express my interest in the {role} position at {company}. \
        With my background in {education} and my skills in {skills}, I am confident \
        that I can contribute meaningfully to your team.\n\
        \n\
        I would welcome the opportunity to discuss how my experience aligns with the \
        needs of {company}. I can be reached at {email} or {phone} at your convenience.\n\
        \n\
        Thank you for your time and consideration. I look forward to hearing from you.\n\
        \n\
        Sincerely,\n\
        {name}\n\
        {location}\n\
        {email}\n\
        {phone}",
        hr_name = ctx.hr_name,
        role = ctx.job_role,
        company = ctx.company,
        education = ctx.education,
        skills = ctx.skills,
        email = ctx.user_email,
        phone = ctx.user_phone,
        name = ctx.name,
        location = ctx.location,
    );

    GeneratedEmail { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asha() -> ApplicationContext {
        ApplicationContext {
            name: "Asha".to_string(),
            job_role: "Backend Developer".to_string(),
            company: "Acme".to_string(),
            user_email: "asha@x.com".to_string(),
            hr_email: "hr@acme.com".to_string(),
            ..ApplicationContext::default()
        }
    }

    #[test]
    fn test_fallback_subject_format() {
        let email = fallback_email(&asha());
        assert_eq!(email.subject, "Application for Backend Developer – Asha");
    }

    #[test]
    fn test_fallback_body_greeting_company_and_signature() {
        let body = fallback_email(&asha()).body;
        assert!(body.starts_with("Dear HR Manager,\n\n"));
        assert!(body.contains("Backend Developer position at Acme."));
        assert!(body.ends_with("Sincerely,\nAsha\nIndia\nasha@x.com\nNot provided"));
        assert_eq!(body.split("\n\n").count(), 5);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_email(&asha()), fallback_email(&asha()));
    }

    #[test]
    fn test_fallback_subject_is_capped() {
        let ctx = ApplicationContext {
            job_role: "Principal Distributed Systems and Infrastructure Reliability Engineer".to_string(),
            name: "Anantharamakrishnan Venkataraghavan".to_string(),
            ..ApplicationContext::default()
        };
        let subject = fallback_email(&ctx).subject;
        assert_eq!(subject.chars().count(), 90);
        assert!(subject.ends_with("..."));
    }
}
