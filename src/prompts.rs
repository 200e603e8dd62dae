//! Prompts sent to the model.
//!
//! The response format mirrors [`crate::feedback::Feedback`] field for field;
//! changing one without the other breaks parsing.

/// System prompt used when `AnalysisConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in ATS (Applicant Tracking System) and resume analysis. \
You read resume page images and return a structured, honest assessment as JSON.";

/// Shape of the JSON object the model must return.
pub const AI_RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; //max 100
  ATS: {
    score: number; //rate based on ATS suitability
    tips: {
      type: "good" | "improve";
      tip: string; //give 3-4 tips
    }[];
  };
  toneAndStyle: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  content: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  structure: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
  skills: {
    score: number; //max 100
    tips: {
      type: "good" | "improve";
      tip: string; //make it a short "title" for the actual explanation
      explanation: string; //explain in detail here
    }[]; //give 3-4 tips
  };
}"#;

/// Build the analysis instructions for one job.
///
/// Empty job fields are passed through as-is; the model is told to judge the
/// resume on general quality when no description is given.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        "You are an expert in ATS (Applicant Tracking System) and resume analysis.\n\
Please analyze and rate this resume and suggest how to improve it.\n\
The rating can be low if the resume is bad.\n\
Be thorough and detailed. Don't be afraid to point out any mistakes or areas for improvement.\n\
If there is a lot to improve, don't hesitate to give low scores. This is to help the user to improve their resume.\n\
If available, use the job description for the job user is applying to to give more detailed feedback.\n\
If provided, take the job description into consideration.\n\
All scores are integers between 0 and 100.\n\
The job title is: {job_title}\n\
The job description is: {job_description}\n\
Provide the feedback using the following format:\n\
{AI_RESPONSE_FORMAT}\n\
Return the analysis as a JSON object, without any other text and without the backticks.\n\
Do not include any other text or comments."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_job_and_schema() {
        let s = prepare_instructions("Data Engineer", "Spark and Airflow");
        assert!(s.contains("The job title is: Data Engineer"));
        assert!(s.contains("The job description is: Spark and Airflow"));
        assert!(s.contains("toneAndStyle"));
        assert!(s.contains("without the backticks"));
    }
}
