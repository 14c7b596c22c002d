// All LLM prompt templates for the assessment stages.
// Placeholders are `{name}` and are filled with `str::replace` before sending.
// Literal JSON braces in the templates are therefore left unescaped.

/// Extract prompt. Replace: {job_description}
pub const EXTRACT_PROMPT_TEMPLATE: &str = "Analyze this job description and extract the key \
responsibilities and the skills a candidate needs to perform them. List responsibilities \
first, then technical skills, then soft skills.

Job Description:
{job_description}";

/// Topic generation prompt.
/// Replace: {num_broader_topics}, {num_subtopics}, {key_responsibilities}, {json_notes}
pub const TOPIC_GENERATION_PROMPT_TEMPLATE: &str = r#"You are an expert in analyzing job descriptions and identifying the topics and subtopics a skills assessment should cover.
From the responsibilities and skills below, identify exactly {num_broader_topics} broader topics and exactly {num_subtopics} subtopics under each broader topic.

Responsibilities and skills:
{key_responsibilities}

Guidelines:
1. Generate exactly {num_broader_topics} broader topics
2. Give every broader topic exactly {num_subtopics} subtopics
3. Tag each subtopic with a priority (high/medium/low) reflecting its weight in the job description
4. Include technical and soft skills where applicable
5. Consider both explicit and implicit requirements
6. Keep topics distinct and non-overlapping
7. Cover the most important aspects first

Return a JSON object with this EXACT schema (no extra fields):
{
  "broaderTopics": [
    {
      "broaderTopic": "Name of the broader topic category",
      "subtopics": [
        {"name": "Name of the subtopic", "priority": "high"}
      ]
    }
  ]
}

{json_notes}

Check before answering:
- There are exactly {num_broader_topics} broader topics
- Each broader topic has exactly {num_subtopics} subtopics
- Priorities are assigned from the job requirements"#;

/// Topic categorization prompt. Replace: {topics}, {json_notes}
pub const CATEGORIZATION_PROMPT_TEMPLATE: &str = r#"You are an expert in ranking technical topics by how difficult they are to master.
Below are the broader topics (with their subtopics) derived from a job description. Categorize ONLY the broader topics into difficulty levels.

Input Topics:
{topics}

Very Hard:
- Deep theoretical knowledge plus extensive practical experience
- Complex mathematical or engineering principles
- Integration of several complex technical domains

Hard:
- Significant technical expertise
- Detailed understanding of processes and systems
- Several years of experience to master

Medium:
- Moderate technical knowledge
- Learnable through standard industry experience
- Standard tools and methodologies

Easy:
- Learnable through basic training
- General skills or standard procedures
- Common industry practices or soft skills

Weigh for each broader topic: the complexity of its subtopics, the depth of knowledge required, the learning curve, and its dependencies on the other topics.

Return a JSON object with this EXACT schema:
{
  "veryHard": ["broader topic name"],
  "hard": [],
  "medium": [],
  "easy": []
}

Rules:
- Use the broader topic names exactly as given
- Categorize ONLY the broader topics, never the subtopics
- Every broader topic appears in exactly one category
- Base the classification on industry standards and typical learning curves

{json_notes}"#;

/// Style diversification prompt.
/// Replace: {job_description}, {topics}, {num_styles}, {json_notes}
pub const STYLE_PROMPT_TEMPLATE: &str = r#"# Assessment Style Generator

## Inputs
1. **Job Description:** {job_description}
2. **Broader Topics and Subtopics:** {topics}

## Output Format
{
  "question_styles": [
    {
      "style_name": "[Assessment Type] - [Focus Area]",
      "definition": "What this style involves and what response it expects",
      "example": "A concrete example question in this style",
      "assessment_goal": "The specific skills or knowledge being evaluated",
      "suitable_for_topics": ["subtopics from the input this style suits"]
    }
  ]
}

## Style Names
- Explicit and self-explanatory; state both the method and the content area
- Format: [Assessment Type] - [Focus Area]
- Reflect the complexity level of the role

## Definitions, Examples and Goals
- Definitions say what the style involves and what kind of answer is expected
- Examples are realistic, industry-relevant, and pitched at the job level
- Goals name measurable criteria linked to the job requirements, technical and soft skills alike

## Topic Matching
- Only use subtopics that appear in the input
- Prefer specific subtopics over general ones

## Usage
1. Generate exactly {num_styles} distinct styles, at least one per major job requirement
2. Cover both technical and practical aspects
3. Include styles for specific knowledge and for broader capabilities
4. Use the company and industry context in the examples

{json_notes}"#;

/// Interlinking prompt.
/// Replace: {job_description}, {topics}, {max_pairs}, {json_notes}
pub const INTERLINKING_PROMPT_TEMPLATE: &str = r#"## Input
{
  "jobDescription": {job_description},
  "broaderTopicsAndSubtopics": {topics}
}

## Task
1. Analyze the subtopics against the job description
2. Group topics (two or more per group) so that one question can:
   - demonstrate practical application of knowledge
   - test several competencies at once
   - reflect a real-world problem-solving scenario
   - map to the job responsibilities
3. For each group give the topics, the rationale, a short assessment scenario, the job relevance, and a priority

## Output Format
{
  "topicPairs": [
    {
      "topics": ["Reactor Design", "Heat Exchanger Design"],
      "rationale": "Tests thermal management in reaction systems",
      "assessmentExample": "Size the cooling system for an exothermic batch reactor",
      "jobRelevance": "Equipment design and energy balance responsibilities",
      "priority": "high"
    }
  ]
}

## Constraints
- At most {max_pairs} topic groups
- Every topic appears in at least one group
- High-priority topics appear in more than one group
- Safety-related topics appear in at least one group
- Medium-priority topics appear at least once; low-priority topics only where relevant

{json_notes}"#;

/// Assessment compilation prompt.
/// Replace: {liked_styles}, {topic_pairs}, {job_description}, {num_questions}, {json_notes}
pub const COMPILATION_PROMPT_TEMPLATE: &str = r#"## Purpose
Write multiple-choice assessment questions from the chosen question styles and topic combinations.

## Inputs
1. **Liked Question Styles:** {liked_styles}
2. **Topic Combinations:** {topic_pairs}
3. **Job Description:** {job_description}

## Instructions
Write exactly {num_questions} questions. Each question:
- follows the approach of one liked style
- integrates every topic of one combination
- matches the job level and the industry context
- maps to specific job responsibilities

## Output Format
{
  "questions": [
    {
      "question": "The question stem, without the options",
      "options": ["A) ...", "B) ...", "C) ...", "D) ..."],
      "correct_answer": "B) ...",
      "style": "style_name of the liked style used",
      "topics": ["topics from the combination used"]
    }
  ]
}

## Validation
1. The question reflects its style definition
2. All combined topics are meaningfully incorporated
3. Complexity matches the job requirements
4. The context matches the industry setting
5. The link to the job responsibilities is clear

{json_notes}"#;
